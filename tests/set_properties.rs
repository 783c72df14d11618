// FlatHashSet property tests against a BTreeSet model, mirroring the map
// suite: model equivalence under arbitrary insert/remove/contains
// interleavings, load bounds at every step, exact remove_if filtering, and
// iteration as a permutation of the live set.

use std::collections::BTreeSet;

use flathash::FlatHashSet;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_model_equivalence(
        ops in proptest::collection::vec((0u8..=2u8, 1u64..=40u64), 1..300),
    ) {
        let mut set: FlatHashSet<u64> = FlatHashSet::new();
        let mut model: BTreeSet<u64> = BTreeSet::new();

        for (op, key) in ops {
            match op {
                0 => prop_assert_eq!(set.insert(key), model.insert(key)),
                1 => prop_assert_eq!(set.remove(&key), model.remove(&key)),
                2 => prop_assert_eq!(set.contains(&key), model.contains(&key)),
                _ => unreachable!(),
            }

            prop_assert_eq!(set.len(), model.len());
            if set.bucket_count() > 0 {
                let mask = set.bucket_count() - 1;
                prop_assert!(set.len() * 5 <= mask * 3);
            }
        }

        let visited: Vec<u64> = set.iter().copied().collect();
        prop_assert_eq!(visited.len(), model.len());
        let collected: BTreeSet<u64> = visited.into_iter().collect();
        prop_assert_eq!(collected, model);
    }

    #[test]
    fn prop_remove_if_filters_exactly(
        keys in proptest::collection::btree_set(1u64..=1500u64, 1..150),
        threshold in 1u64..=1500u64,
    ) {
        let mut set: FlatHashSet<u64> = keys.iter().copied().collect();

        set.remove_if(|key| *key > threshold);

        let expected = keys.iter().filter(|&&k| k <= threshold).count();
        prop_assert_eq!(set.len(), expected);
        for &key in &keys {
            prop_assert_eq!(set.contains(&key), key <= threshold);
        }
    }

    #[test]
    fn prop_clone_agrees_on_membership(
        keys in proptest::collection::btree_set(1u64..=3000u64, 0..200),
        probes in proptest::collection::vec(0u64..=3500u64, 1..80),
    ) {
        let set: FlatHashSet<u64> = keys.iter().copied().collect();
        let copy = set.clone();

        prop_assert_eq!(copy.len(), set.len());
        for probe in probes {
            prop_assert_eq!(copy.contains(&probe), set.contains(&probe));
        }
    }
}
