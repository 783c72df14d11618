//! A flat, open-addressed hash table with sentinel-keyed buckets.
//!
//! The table is a single contiguous allocation: a small header (occupant
//! count and bucket mask) immediately followed by a power-of-two array of
//! buckets. Each bucket stores one [`Node`] in place; there is no per-entry
//! indirection and no occupancy bitmap, because a vacant bucket is marked by
//! its node carrying the key type's default value (the *empty sentinel*).
//! The table itself is just one pointer, aimed at bucket zero; the header is
//! recovered by a fixed negative offset so the hot probe loop never pays an
//! extra add to reach the buckets. An empty table holds no allocation at all.
//!
//! [`FlatHashTable<N>`] is a fairly low-level structure: operations take a
//! precomputed hash for the probe key plus `eq`/`rehash` closures, and the
//! bucket nodes are exposed directly. Prefer the [`FlatHashMap`] or
//! [`FlatHashSet`] wrappers unless you are building your own map or set
//! surface on top.
//!
//! ## Design
//!
//! Lookup is plain linear probing: hash the key, mask into the bucket array,
//! walk forward until the key or a vacant bucket appears. Client hashes are
//! first pushed through a fixed 32-bit avalanche mixer (the finalizer from
//! MurmurHash3) so that weak or adversarial hash functions cannot degrade the
//! probe sequences; masking relies on the bucket count being a power of two.
//!
//! Insertion never displaces existing entries. What keeps plain linear
//! probing correct over time is the erase side: removal uses backward-shift
//! deletion, walking forward from the emptied bucket and pulling back any
//! entry that would otherwise become unreachable from its home bucket. No
//! tombstones are ever written, so lookups never scan deletion markers and
//! the probe invariant — every bucket between an entry's home and its actual
//! position is occupied — holds at all times.
//!
//! The load factor is capped at 0.6: the table doubles when one more
//! occupant would push it past the cap, and shrinks back when fewer than a
//! tenth of the buckets are in use. Bucket counts range from 8 to 2^29.
//!
//! Iteration deliberately starts at a uniformly random bucket and walks the
//! array cyclically from there. Two iterations of the same unmodified table
//! yield different orders; clients that depend on iteration order are broken
//! by construction, and this surfaces them early.
//!
//! ## Safety invariants
//!
//! The implementation relies on the following:
//!
//! 1. Every bucket of a live allocation always holds an initialized node,
//!    vacant or occupied; the region is created fully vacant and nodes are
//!    only exchanged or overwritten through `&mut` access.
//! 2. A node whose key is the sentinel is vacant; its payload storage is
//!    dead. The unsafe payload accessors of [`MapNode`] are only reached
//!    through probes and iterators that establish occupancy first.
//! 3. The bucket pointer always sits exactly `nodes_offset` bytes past the
//!    start of an allocation shaped `[Header | padding | buckets]`, so the
//!    header back-offset is in bounds whenever the pointer is non-null.
//! 4. The occupant count never exceeds `0.6 * bucket_count`, so every probe
//!    and every backward shift terminates at a vacant bucket.
//!
//! [`FlatHashMap`]: crate::map::FlatHashMap
//! [`FlatHashSet`]: crate::set::FlatHashSet
//! [`MapNode`]: crate::node::MapNode

use core::fmt::Debug;
use core::marker::PhantomData;
use core::ptr::NonNull;
use std::alloc::handle_alloc_error;
use std::alloc::Layout;

use crate::node::Node;

/// Smallest non-null bucket count.
const MIN_BUCKET_COUNT: u32 = 8;

/// Largest supported bucket count. Exceeding it is a fatal error.
const MAX_BUCKET_COUNT: u32 = 1 << 29;

/// Mixes a client-supplied hash into a well-distributed 32-bit value.
///
/// This is the MurmurHash3 finalizer applied to the low word. It runs in
/// front of the bucket mask on every probe, so low-entropy client hashes
/// (identity hashes over small integers are the common case) still spread
/// across the table.
#[inline(always)]
fn randomize_hash(hash: u64) -> u32 {
    let mut x = hash as u32;
    x ^= x >> 16;
    x = x.wrapping_mul(0x85eb_ca6b);
    x ^= x >> 13;
    x = x.wrapping_mul(0xc2b2_ae35);
    x ^= x >> 16;
    x
}

/// Maps a hash to its home bucket under the given mask.
#[inline(always)]
fn home_bucket(hash: u64, mask: usize) -> usize {
    (randomize_hash(hash) as usize) & mask
}

/// Smallest power of two strictly greater than `size`, clamped to the
/// minimum bucket count.
///
/// Strictness matters: it is what lets [`FlatHashTable::reserve`] promise
/// that the reserved number of insertions never trips the growth check.
#[inline]
fn normalize(size: u32) -> u32 {
    debug_assert!(size.leading_zeros() >= 2);
    (1u32 << (32 - size.leading_zeros())).max(MIN_BUCKET_COUNT)
}

/// Uniformly random bucket index for the given mask.
#[inline]
fn random_bucket(mask: usize) -> usize {
    (rand::random::<u32>() as usize) & mask
}

/// Table bookkeeping, stored directly in front of the bucket array.
#[repr(C)]
struct Header {
    used: u32,
    mask: u32,
}

#[derive(Clone, Copy)]
struct DataLayout {
    layout: Layout,
    nodes_offset: usize,
}

impl DataLayout {
    fn new<N>(bucket_count: usize) -> Self {
        let nodes_layout = Layout::array::<N>(bucket_count).expect("allocation size overflow");
        let (layout, nodes_offset) = Layout::new::<Header>()
            .extend(nodes_layout)
            .expect("allocation size overflow");

        DataLayout {
            layout: layout.pad_to_align(),
            nodes_offset,
        }
    }
}

/// A flat, open-addressed hash table storing nodes of kind `N`.
///
/// The table does not own a hash function: every operation that needs to
/// locate keys takes the probe key's hash and, where the table may have to
/// relocate existing entries, a `rehash` closure mapping any stored key back
/// to its hash. All `rehash` closures passed to one table must agree with
/// the hashes used to insert its entries.
///
/// The caller must never probe for, or insert, a key equal to the key
/// type's default value; that value is reserved as the vacant-bucket
/// sentinel. Insertion checks this; lookups for the sentinel simply miss.
///
/// Mutable node references handed out by [`find_mut`](Self::find_mut),
/// [`iter_mut`](Self::iter_mut) and the entry API must not be used to
/// rewrite a node's key or replace the node wholesale: the entry would be
/// left unreachable from its home bucket.
pub struct FlatHashTable<N: Node> {
    /// Bucket zero of the live region, or `None` in the null state.
    nodes: Option<NonNull<N>>,
    _marker: PhantomData<N>,
}

impl<N: Node> FlatHashTable<N> {
    /// Creates an empty table without allocating.
    pub const fn new() -> Self {
        FlatHashTable {
            nodes: None,
            _marker: PhantomData,
        }
    }

    /// Byte offset of bucket zero from the start of the allocation.
    #[inline(always)]
    fn nodes_offset() -> usize {
        let (_, offset) = Layout::new::<Header>()
            .extend(Layout::new::<N>())
            .expect("allocation size overflow");
        offset
    }

    #[inline(always)]
    fn header_ptr(nodes: NonNull<N>) -> NonNull<Header> {
        // SAFETY: `nodes` points at bucket zero of a live allocation shaped
        // `[Header | padding | buckets]`, so stepping back by the bucket
        // offset stays inside the allocation and lands on the header.
        unsafe {
            NonNull::new_unchecked(nodes.as_ptr().cast::<u8>().sub(Self::nodes_offset()).cast())
        }
    }

    #[inline(always)]
    fn header(&self) -> Option<&Header> {
        // SAFETY: a non-null bucket pointer always has a live header in
        // front of it; the reference is tied to `&self`.
        self.nodes.map(|nodes| unsafe { Self::header_ptr(nodes).as_ref() })
    }

    #[inline(always)]
    fn header_mut(&mut self) -> &mut Header {
        let Some(nodes) = self.nodes else {
            unreachable!("header access on a table in the null state");
        };
        // SAFETY: as in `header`, plus exclusive access through `&mut self`.
        unsafe { Self::header_ptr(nodes).as_mut() }
    }

    /// Every bucket of the live region, or an empty slice in the null state.
    #[inline(always)]
    fn slots(&self) -> &[N] {
        match self.nodes {
            None => &[],
            // SAFETY: the region holds `mask + 1` initialized nodes starting
            // at bucket zero (safety invariant 1).
            Some(nodes) => unsafe {
                let count = Self::header_ptr(nodes).as_ref().mask as usize + 1;
                core::slice::from_raw_parts(nodes.as_ptr(), count)
            },
        }
    }

    #[inline(always)]
    fn slots_mut(&mut self) -> &mut [N] {
        match self.nodes {
            None => &mut [],
            // SAFETY: as in `slots`, plus exclusive access through
            // `&mut self`.
            Some(nodes) => unsafe {
                let count = Self::header_ptr(nodes).as_ref().mask as usize + 1;
                core::slice::from_raw_parts_mut(nodes.as_ptr(), count)
            },
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.header().map_or(0, |header| header.used as usize)
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of buckets, zero in the null state.
    pub fn bucket_count(&self) -> usize {
        self.header().map_or(0, |header| header.mask as usize + 1)
    }

    /// Allocates a fully vacant region and returns its bucket-zero pointer.
    fn allocate_region(bucket_count: u32) -> NonNull<N> {
        debug_assert!(bucket_count.is_power_of_two());
        debug_assert!(bucket_count >= MIN_BUCKET_COUNT);
        assert!(
            bucket_count <= MAX_BUCKET_COUNT,
            "bucket count {} exceeds the maximum table size",
            bucket_count,
        );

        let layout = DataLayout::new::<N>(bucket_count as usize);
        debug_assert_eq!(layout.nodes_offset, Self::nodes_offset());

        // SAFETY: the layout is non-zero sized (it contains the header), and
        // a null return is handled as a fatal allocation error.
        unsafe {
            let raw = std::alloc::alloc(layout.layout);
            if raw.is_null() {
                handle_alloc_error(layout.layout);
            }

            raw.cast::<Header>().write(Header {
                used: 0,
                mask: bucket_count - 1,
            });

            let nodes = raw.add(layout.nodes_offset).cast::<N>();
            for i in 0..bucket_count as usize {
                nodes.add(i).write(N::vacant());
            }

            NonNull::new_unchecked(nodes)
        }
    }

    /// Drops every node in the region and frees it.
    ///
    /// # Safety
    ///
    /// `nodes` must be the bucket-zero pointer of a live region that is no
    /// longer reachable from any table.
    unsafe fn release_region(nodes: NonNull<N>) {
        // SAFETY: the caller hands over a live region; the header in front
        // of it records the bucket count the region was allocated with.
        unsafe {
            let count = Self::header_ptr(nodes).as_ref().mask as usize + 1;
            let layout = DataLayout::new::<N>(count);

            for i in 0..count {
                let node = nodes.as_ptr().add(i);
                if !(*node).is_vacant() {
                    // SAFETY: the node is occupied, so it owns a live
                    // payload that must be dropped exactly once.
                    (*node).reset();
                }
                core::ptr::drop_in_place(node);
            }

            let raw = nodes.as_ptr().cast::<u8>().sub(Self::nodes_offset());
            std::alloc::dealloc(raw, layout.layout);
        }
    }

    /// Drops all entries and the allocation, returning to the null state.
    pub fn clear(&mut self) {
        if let Some(nodes) = self.nodes.take() {
            // SAFETY: the pointer came from `allocate_region` and was just
            // detached from `self`.
            unsafe { Self::release_region(nodes) };
        }
    }

    /// Exchanges the contents of two tables.
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(&mut self.nodes, &mut other.nodes);
    }

    /// Walks forward from the hash's home bucket. `Ok` holds the index of
    /// the occupied bucket whose key matched `eq`; `Err` holds the index of
    /// the vacant bucket that terminated the walk.
    ///
    /// The table must not be in the null state.
    #[inline]
    fn probe(&self, hash: u64, eq: &impl Fn(&N::Key) -> bool) -> Result<usize, usize> {
        let slots = self.slots();
        debug_assert!(!slots.is_empty());
        let mask = slots.len() - 1;
        let mut bucket = home_bucket(hash, mask);
        loop {
            // SAFETY: `bucket` is masked into range on every step.
            let node = unsafe { slots.get_unchecked(bucket) };
            if eq(node.key()) {
                return Ok(bucket);
            }
            if node.is_vacant() {
                return Err(bucket);
            }
            bucket = (bucket + 1) & mask;
        }
    }

    /// Looks up an entry by its hash and an equality predicate over keys.
    ///
    /// `eq` is also applied to the sentinel keys of vacant buckets along the
    /// probe path; it must return `false` for them.
    pub fn find(&self, hash: u64, eq: impl Fn(&N::Key) -> bool) -> Option<&N> {
        if self.nodes.is_none() {
            return None;
        }
        let index = self.probe(hash, &eq).ok()?;
        // SAFETY: `probe` only returns `Ok` for in-range occupied buckets.
        Some(unsafe { self.slots().get_unchecked(index) })
    }

    /// Mutable variant of [`find`](Self::find).
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&N::Key) -> bool) -> Option<&mut N> {
        if self.nodes.is_none() {
            return None;
        }
        let index = self.probe(hash, &eq).ok()?;
        // SAFETY: `probe` only returns `Ok` for in-range occupied buckets.
        Some(unsafe { self.slots_mut().get_unchecked_mut(index) })
    }

    /// Locates the bucket for a hash, growing the table first if inserting
    /// one more entry would break the load bound.
    ///
    /// The returned [`Entry`] either refers to the occupied bucket whose key
    /// matched `eq`, or to the vacant bucket where a matching node belongs.
    pub fn entry(
        &mut self,
        hash: u64,
        eq: impl Fn(&N::Key) -> bool,
        rehash: impl Fn(&N::Key) -> u64,
    ) -> Entry<'_, N> {
        self.try_grow(&rehash);
        match self.probe(hash, &eq) {
            Ok(index) => Entry::Occupied(OccupiedEntry { table: self, index }),
            Err(index) => Entry::Vacant(VacantEntry { table: self, index }),
        }
    }

    /// Removes and returns the entry matching `eq`, if any.
    pub fn remove(
        &mut self,
        hash: u64,
        eq: impl Fn(&N::Key) -> bool,
        rehash: impl Fn(&N::Key) -> u64,
    ) -> Option<N> {
        if self.is_empty() {
            return None;
        }
        let index = self.probe(hash, &eq).ok()?;
        let node = self.remove_at(index, &rehash);
        self.try_shrink(&rehash);
        Some(node)
    }

    /// Moves the node out of an occupied bucket and restores the probe
    /// invariant. Does not shrink.
    fn remove_at(&mut self, index: usize, rehash: &impl Fn(&N::Key) -> u64) -> N {
        // SAFETY: callers pass the index of an occupied bucket.
        let node = unsafe { self.slots_mut()[index].take() };
        self.header_mut().used -= 1;
        self.backward_shift(index, rehash);
        node
    }

    /// Drops the entry in an occupied bucket in place and restores the probe
    /// invariant. Does not shrink.
    fn erase_slot(&mut self, index: usize, rehash: &impl Fn(&N::Key) -> u64) {
        // SAFETY: callers pass the index of an occupied bucket.
        unsafe { self.slots_mut()[index].reset() };
        self.header_mut().used -= 1;
        self.backward_shift(index, rehash);
    }

    /// Backward-shift deletion: refills the hole at `hole` by walking
    /// forward and pulling back every entry that a lookup starting from its
    /// home bucket would otherwise fail to reach past the hole.
    fn backward_shift(&mut self, hole: usize, rehash: &impl Fn(&N::Key) -> u64) {
        let slots = self.slots_mut();
        let count = slots.len();
        let mask = count - 1;

        let mut empty_i = hole;
        let mut empty_bucket = hole;
        let mut test_i = hole;
        loop {
            test_i += 1;
            let test_bucket = if test_i >= count { test_i - count } else { test_i };
            if slots[test_bucket].is_vacant() {
                break;
            }

            // Linearize the occupant's home position onto the axis running
            // through the hole: homes numerically below the hole sit one
            // wrap ahead of it.
            let mut want_i = home_bucket(rehash(slots[test_bucket].key()), mask);
            if want_i < empty_i {
                want_i += count;
            }

            if want_i <= empty_i || want_i > test_i {
                // The hole is vacant, so swapping moves the occupant back
                // and leaves the vacancy at `test_bucket`.
                slots.swap(empty_bucket, test_bucket);
                empty_i = test_i;
                empty_bucket = test_bucket;
            }
        }
    }

    /// Erases every entry for which `f` returns `true`.
    ///
    /// Backward shifts rearrange entries while the scan is running, so the
    /// walk is anchored at a vacant bucket: entries never shift across one,
    /// and scanning each side of it separately visits every original
    /// occupant exactly once. `f` sees each occupant at most once per call.
    pub fn remove_if(
        &mut self,
        mut f: impl FnMut(&mut N) -> bool,
        rehash: impl Fn(&N::Key) -> u64,
    ) {
        if self.is_empty() {
            return;
        }

        let count = self.bucket_count();
        let split = {
            let slots = self.slots();
            let mask = count - 1;
            let mut start = random_bucket(mask);
            while slots[start].is_vacant() {
                start = (start + 1) & mask;
            }
            // First vacant bucket at or after the start in array order,
            // falling back to the last vacant bucket before it.
            let mut i = start;
            while i < count && !slots[i].is_vacant() {
                i += 1;
            }
            if i == count {
                loop {
                    i -= 1;
                    if slots[i].is_vacant() {
                        break;
                    }
                }
            }
            i
        };

        let mut i = split;
        while i < count {
            if self.should_erase(i, &mut f) {
                self.erase_slot(i, &rehash);
            } else {
                i += 1;
            }
        }
        let mut i = 0;
        while i != split {
            if self.should_erase(i, &mut f) {
                self.erase_slot(i, &rehash);
            } else {
                i += 1;
            }
        }

        self.try_shrink(&rehash);
    }

    fn should_erase(&mut self, index: usize, f: &mut impl FnMut(&mut N) -> bool) -> bool {
        let node = &mut self.slots_mut()[index];
        !node.is_vacant() && f(node)
    }

    /// Ensures capacity for at least `capacity` entries without further
    /// growth. Never shrinks. `capacity` beyond the maximum table size is a
    /// fatal error.
    pub fn reserve(&mut self, capacity: usize, rehash: impl Fn(&N::Key) -> u64) {
        if capacity == 0 {
            return;
        }
        assert!(
            capacity <= MAX_BUCKET_COUNT as usize,
            "cannot reserve space for {} entries",
            capacity,
        );
        let want = normalize(capacity as u32 * 5 / 3 + 1);
        if want as usize > self.bucket_count() {
            self.resize(want, &rehash);
        }
    }

    fn try_grow(&mut self, rehash: &impl Fn(&N::Key) -> u64) {
        match self.header() {
            None => self.resize(MIN_BUCKET_COUNT, rehash),
            Some(header) => {
                // Grow when one more occupant would push the load factor
                // past 0.6.
                if (header.used + 1) * 5 > header.mask * 3 {
                    let new_count = (header.mask + 1) * 2;
                    self.resize(new_count, rehash);
                }
            }
        }
    }

    fn try_shrink(&mut self, rehash: &impl Fn(&N::Key) -> u64) {
        let Some(header) = self.header() else {
            unreachable!("shrink check on a table in the null state");
        };
        if header.used * 10 < header.mask && header.mask > 7 {
            self.resize(normalize((header.used + 1) * 5 / 3 + 1), rehash);
        }
    }

    /// Replaces the bucket region with one of `new_bucket_count` buckets,
    /// relocating every occupant by re-probing from its new home bucket.
    fn resize(&mut self, new_bucket_count: u32, rehash: &impl Fn(&N::Key) -> u64) {
        let new_nodes = Self::allocate_region(new_bucket_count);
        let new_mask = (new_bucket_count - 1) as usize;

        let Some(old_nodes) = self.nodes.replace(new_nodes) else {
            return;
        };

        // SAFETY: both regions are live and distinct; the old header records
        // the old region's bucket count, and every slot of both regions
        // holds an initialized node.
        unsafe {
            let old_header = Self::header_ptr(old_nodes).as_ref();
            let old_count = old_header.mask as usize + 1;
            let old_used = old_header.used;

            Self::header_ptr(new_nodes).as_mut().used = old_used;

            let old_slots = core::slice::from_raw_parts_mut(old_nodes.as_ptr(), old_count);
            let new_slots =
                core::slice::from_raw_parts_mut(new_nodes.as_ptr(), new_bucket_count as usize);

            for old_node in old_slots.iter_mut() {
                if old_node.is_vacant() {
                    continue;
                }
                // SAFETY: the node is occupied; `take` leaves the old slot
                // vacant for the region teardown below.
                let node = old_node.take();
                let mut bucket = home_bucket(rehash(node.key()), new_mask);
                while !new_slots[bucket].is_vacant() {
                    bucket = (bucket + 1) & new_mask;
                }
                new_slots[bucket] = node;
            }

            Self::release_region(old_nodes);
        }
    }

    /// Copies this table into a fresh one with the same bucket count,
    /// re-probing every entry from its home bucket.
    ///
    /// `rehash` must agree with the hashes the entries were inserted under;
    /// the copy answers lookups for those same hashes.
    pub fn clone_with(&self, rehash: impl Fn(&N::Key) -> u64) -> Self
    where
        N: Clone,
    {
        let mut copy = Self::new();
        let Some(header) = self.header() else {
            return copy;
        };
        if header.used == 0 {
            return copy;
        }

        let used = header.used;
        let count = header.mask + 1;
        copy.resize(count, &rehash);

        {
            let mask = (count - 1) as usize;
            let dst = copy.slots_mut();
            for node in self.slots() {
                if node.is_vacant() {
                    continue;
                }
                let mut bucket = home_bucket(rehash(node.key()), mask);
                while !dst[bucket].is_vacant() {
                    bucket = (bucket + 1) & mask;
                }
                dst[bucket] = node.clone();
            }
        }
        copy.header_mut().used = used;

        copy
    }

    /// Iterates over every occupied bucket, starting from a fresh random
    /// bucket each call.
    ///
    /// Every live entry is yielded exactly once, but the order is not stable
    /// — not even across two calls on the same unmodified table.
    pub fn iter(&self) -> Iter<'_, N> {
        let slots = self.slots();
        let remaining = self.len();
        if remaining == 0 {
            return Iter {
                slots,
                start: 0,
                cursor: None,
                remaining: 0,
            };
        }

        let mask = slots.len() - 1;
        let mut bucket = random_bucket(mask);
        while slots[bucket].is_vacant() {
            bucket = (bucket + 1) & mask;
        }
        Iter {
            slots,
            start: bucket,
            cursor: Some(bucket),
            remaining,
        }
    }

    /// Mutable variant of [`iter`](Self::iter).
    pub fn iter_mut(&mut self) -> IterMut<'_, N> {
        let remaining = self.len();
        let start = if remaining == 0 {
            None
        } else {
            let slots = self.slots();
            let mask = slots.len() - 1;
            let mut bucket = random_bucket(mask);
            while slots[bucket].is_vacant() {
                bucket = (bucket + 1) & mask;
            }
            Some(bucket)
        };

        IterMut {
            nodes: self.nodes.unwrap_or(NonNull::dangling()),
            count: self.bucket_count(),
            start: start.unwrap_or(0),
            cursor: start,
            remaining,
            _marker: PhantomData,
        }
    }
}

impl<N: Node> Default for FlatHashTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Node> Drop for FlatHashTable<N> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<N: Node> Debug for FlatHashTable<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let occupancy: String = self
            .slots()
            .iter()
            .map(|node| if node.is_vacant() { '.' } else { '#' })
            .collect();
        f.debug_struct("FlatHashTable")
            .field("len", &self.len())
            .field("bucket_count", &self.bucket_count())
            .field("occupancy", &occupancy)
            .finish()
    }
}

/// A bucket located by [`FlatHashTable::entry`], occupied or vacant.
pub enum Entry<'a, N: Node> {
    /// The probed key is present in the table.
    Occupied(OccupiedEntry<'a, N>),
    /// The probed key is absent; this is the bucket it belongs in.
    Vacant(VacantEntry<'a, N>),
}

/// An occupied bucket, with exclusive access to the table.
pub struct OccupiedEntry<'a, N: Node> {
    table: &'a mut FlatHashTable<N>,
    index: usize,
}

impl<'a, N: Node> OccupiedEntry<'a, N> {
    /// Borrows the node.
    pub fn get(&self) -> &N {
        // SAFETY: the entry was constructed from an occupied probe result.
        unsafe { self.table.slots().get_unchecked(self.index) }
    }

    /// Mutably borrows the node.
    pub fn get_mut(&mut self) -> &mut N {
        // SAFETY: the entry was constructed from an occupied probe result.
        unsafe { self.table.slots_mut().get_unchecked_mut(self.index) }
    }

    /// Converts the entry into a mutable borrow tied to the table.
    pub fn into_mut(self) -> &'a mut N {
        // SAFETY: the entry was constructed from an occupied probe result.
        unsafe { self.table.slots_mut().get_unchecked_mut(self.index) }
    }

    /// Removes the entry, returning its node.
    ///
    /// `rehash` must agree with the hashes the table's entries were inserted
    /// under; it drives the backward shift that repairs the probe chain.
    pub fn remove(self, rehash: impl Fn(&N::Key) -> u64) -> N {
        let node = self.table.remove_at(self.index, &rehash);
        self.table.try_shrink(&rehash);
        node
    }
}

/// A vacant bucket, ready to receive a node.
pub struct VacantEntry<'a, N: Node> {
    table: &'a mut FlatHashTable<N>,
    index: usize,
}

impl<'a, N: Node> VacantEntry<'a, N> {
    /// Fills the bucket with `node` and returns a mutable borrow of it.
    ///
    /// `node` must carry the key the entry was probed for. A vacant node is
    /// rejected fatally: the sentinel key can never be inserted.
    pub fn insert(self, node: N) -> &'a mut N {
        assert!(
            !node.is_vacant(),
            "the empty sentinel key cannot be inserted",
        );
        let table = self.table;
        table.header_mut().used += 1;
        // SAFETY: the entry was constructed from a vacant probe result.
        let slot = unsafe { table.slots_mut().get_unchecked_mut(self.index) };
        debug_assert!(slot.is_vacant());
        *slot = node;
        slot
    }
}

/// Immutable table iterator with a randomized starting bucket.
pub struct Iter<'a, N> {
    slots: &'a [N],
    start: usize,
    cursor: Option<usize>,
    remaining: usize,
}

impl<N> Clone for Iter<'_, N> {
    fn clone(&self) -> Self {
        Iter {
            slots: self.slots,
            start: self.start,
            cursor: self.cursor,
            remaining: self.remaining,
        }
    }
}

impl<'a, N: Node> Iter<'a, N> {
    fn advance(&self, mut bucket: usize) -> Option<usize> {
        let mask = self.slots.len() - 1;
        loop {
            bucket = (bucket + 1) & mask;
            if bucket == self.start {
                return None;
            }
            // SAFETY: `bucket` is masked into range on every step.
            if !unsafe { self.slots.get_unchecked(bucket) }.is_vacant() {
                return Some(bucket);
            }
        }
    }
}

impl<'a, N: Node> Iterator for Iter<'a, N> {
    type Item = &'a N;

    fn next(&mut self) -> Option<&'a N> {
        let current = self.cursor?;
        // SAFETY: the cursor always holds an in-range occupied bucket.
        let node = unsafe { self.slots.get_unchecked(current) };
        self.cursor = self.advance(current);
        self.remaining -= 1;
        Some(node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<N: Node> ExactSizeIterator for Iter<'_, N> {}

impl<N: Node> core::iter::FusedIterator for Iter<'_, N> {}

/// Mutable table iterator with a randomized starting bucket.
pub struct IterMut<'a, N> {
    nodes: NonNull<N>,
    count: usize,
    start: usize,
    cursor: Option<usize>,
    remaining: usize,
    _marker: PhantomData<&'a mut N>,
}

impl<'a, N: Node> IterMut<'a, N> {
    fn advance(&self, mut bucket: usize) -> Option<usize> {
        let mask = self.count - 1;
        loop {
            bucket = (bucket + 1) & mask;
            if bucket == self.start {
                return None;
            }
            // SAFETY: `bucket` is masked into range, and this shared read
            // ends before any mutable reference to the bucket is handed out.
            if !unsafe { (*self.nodes.as_ptr().add(bucket)).is_vacant() } {
                return Some(bucket);
            }
        }
    }
}

impl<'a, N: Node> Iterator for IterMut<'a, N> {
    type Item = &'a mut N;

    fn next(&mut self) -> Option<&'a mut N> {
        let current = self.cursor?;
        self.cursor = self.advance(current);
        self.remaining -= 1;
        // SAFETY: the cursor always holds an in-range occupied bucket, and
        // every bucket index is produced at most once per iteration, so the
        // returned references never alias.
        Some(unsafe { &mut *self.nodes.as_ptr().add(current) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<N: Node> ExactSizeIterator for IterMut<'_, N> {}

impl<N: Node> core::iter::FusedIterator for IterMut<'_, N> {}
