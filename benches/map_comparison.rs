use core::hint::black_box;
use std::collections::HashMap as StdHashMap;

use criterion::criterion_group;
use criterion::criterion_main;
use criterion::Criterion;
use criterion::Throughput;
use flathash::DefaultHashBuilder;
use flathash::FlatHashMap;
use hashbrown::HashMap as HashbrownMap;

const SIZES: &[usize] = &[
    ((1 << 10) as f32 * 0.87) as usize,
    ((1 << 15) as f32 * 0.87) as usize,
];

fn keys(size: usize) -> Vec<u64> {
    // Non-zero keys: the flat map reserves 0 as its vacant sentinel.
    (1..=size as u64).map(|k| black_box(k.wrapping_mul(0x9e37_79b9_7f4a_7c15))).collect()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for &size in SIZES {
        let keys = keys(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("flathash/{}", size), |b| {
            b.iter(|| {
                let mut map: FlatHashMap<u64, u64> = FlatHashMap::new();
                for &key in &keys {
                    map.insert(key, key);
                }
                black_box(map)
            })
        });

        group.bench_function(format!("flathash_preallocated/{}", size), |b| {
            b.iter(|| {
                let mut map: FlatHashMap<u64, u64> = FlatHashMap::with_capacity(size);
                for &key in &keys {
                    map.insert(key, key);
                }
                black_box(map)
            })
        });

        group.bench_function(format!("hashbrown/{}", size), |b| {
            b.iter(|| {
                let mut map: HashbrownMap<u64, u64, DefaultHashBuilder> =
                    HashbrownMap::with_hasher(DefaultHashBuilder);
                for &key in &keys {
                    map.insert(key, key);
                }
                black_box(map)
            })
        });

        group.bench_function(format!("std/{}", size), |b| {
            b.iter(|| {
                let mut map: StdHashMap<u64, u64, DefaultHashBuilder> =
                    StdHashMap::with_hasher(DefaultHashBuilder);
                for &key in &keys {
                    map.insert(key, key);
                }
                black_box(map)
            })
        });
    }

    group.finish();
}

fn bench_lookup_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup_hit");

    for &size in SIZES {
        let keys = keys(size);
        group.throughput(Throughput::Elements(size as u64));

        let mut flat: FlatHashMap<u64, u64> = FlatHashMap::new();
        let mut brown: HashbrownMap<u64, u64, DefaultHashBuilder> =
            HashbrownMap::with_hasher(DefaultHashBuilder);
        let mut std_map: StdHashMap<u64, u64, DefaultHashBuilder> =
            StdHashMap::with_hasher(DefaultHashBuilder);
        for &key in &keys {
            flat.insert(key, key);
            brown.insert(key, key);
            std_map.insert(key, key);
        }

        group.bench_function(format!("flathash/{}", size), |b| {
            b.iter(|| {
                let mut sum = 0u64;
                for key in &keys {
                    sum = sum.wrapping_add(*flat.get(key).unwrap());
                }
                black_box(sum)
            })
        });

        group.bench_function(format!("hashbrown/{}", size), |b| {
            b.iter(|| {
                let mut sum = 0u64;
                for key in &keys {
                    sum = sum.wrapping_add(*brown.get(key).unwrap());
                }
                black_box(sum)
            })
        });

        group.bench_function(format!("std/{}", size), |b| {
            b.iter(|| {
                let mut sum = 0u64;
                for key in &keys {
                    sum = sum.wrapping_add(*std_map.get(key).unwrap());
                }
                black_box(sum)
            })
        });
    }

    group.finish();
}

fn bench_lookup_miss(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup_miss");

    for &size in SIZES {
        let present = keys(size);
        let absent: Vec<u64> = present.iter().map(|k| k | 1 << 63).collect();
        group.throughput(Throughput::Elements(size as u64));

        let mut flat: FlatHashMap<u64, u64> = FlatHashMap::new();
        let mut brown: HashbrownMap<u64, u64, DefaultHashBuilder> =
            HashbrownMap::with_hasher(DefaultHashBuilder);
        for &key in &present {
            flat.insert(key, key);
            brown.insert(key, key);
        }

        group.bench_function(format!("flathash/{}", size), |b| {
            b.iter(|| {
                let mut misses = 0usize;
                for key in &absent {
                    misses += usize::from(flat.get(key).is_none());
                }
                black_box(misses)
            })
        });

        group.bench_function(format!("hashbrown/{}", size), |b| {
            b.iter(|| {
                let mut misses = 0usize;
                for key in &absent {
                    misses += usize::from(brown.get(key).is_none());
                }
                black_box(misses)
            })
        });
    }

    group.finish();
}

fn bench_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove_half");

    for &size in SIZES {
        let keys = keys(size);
        let victims: Vec<u64> = keys.iter().copied().step_by(2).collect();
        group.throughput(Throughput::Elements(victims.len() as u64));

        group.bench_function(format!("flathash/{}", size), |b| {
            b.iter_batched(
                || {
                    let mut map: FlatHashMap<u64, u64> = FlatHashMap::new();
                    for &key in &keys {
                        map.insert(key, key);
                    }
                    map
                },
                |mut map| {
                    for key in &victims {
                        black_box(map.remove(key));
                    }
                    map
                },
                criterion::BatchSize::LargeInput,
            )
        });

        group.bench_function(format!("hashbrown/{}", size), |b| {
            b.iter_batched(
                || {
                    let mut map: HashbrownMap<u64, u64, DefaultHashBuilder> =
                        HashbrownMap::with_hasher(DefaultHashBuilder);
                    for &key in &keys {
                        map.insert(key, key);
                    }
                    map
                },
                |mut map| {
                    for key in &victims {
                        black_box(map.remove(key));
                    }
                    map
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");

    for &size in SIZES {
        let keys = keys(size);
        group.throughput(Throughput::Elements(size as u64));

        let mut flat: FlatHashMap<u64, u64> = FlatHashMap::new();
        let mut brown: HashbrownMap<u64, u64, DefaultHashBuilder> =
            HashbrownMap::with_hasher(DefaultHashBuilder);
        for &key in &keys {
            flat.insert(key, key);
            brown.insert(key, key);
        }

        group.bench_function(format!("flathash/{}", size), |b| {
            b.iter(|| {
                let mut sum = 0u64;
                for (_, value) in flat.iter() {
                    sum = sum.wrapping_add(*value);
                }
                black_box(sum)
            })
        });

        group.bench_function(format!("hashbrown/{}", size), |b| {
            b.iter(|| {
                let mut sum = 0u64;
                for (_, value) in brown.iter() {
                    sum = sum.wrapping_add(*value);
                }
                black_box(sum)
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_insert,
    bench_lookup_hit,
    bench_lookup_miss,
    bench_remove,
    bench_iterate,
);
criterion_main!(benches);
