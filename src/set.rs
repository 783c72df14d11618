//! A hash set backed by the flat sentinel-keyed table.
//!
//! [`FlatHashSet<K, S>`] stores keys alone in [`SetNode`] buckets of a
//! [`FlatHashTable`]. The same caller contract as the map applies: the key
//! type's default value is the vacant-bucket sentinel and can never be a
//! live member.

use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::mem;

use crate::node::is_empty_key;
use crate::node::Node;
use crate::node::SetNode;
use crate::table;
use crate::table::FlatHashTable;
use crate::DefaultHashBuilder;

/// A flat, open-addressed hash set with sentinel-keyed buckets.
///
/// Same engine as [`FlatHashMap`](crate::FlatHashMap), minus the values:
/// single contiguous bucket array, backward-shift deletion, randomized
/// iteration start.
///
/// # Examples
///
/// ```rust
/// use flathash::FlatHashSet;
///
/// let mut seen = FlatHashSet::new();
/// assert!(seen.insert(41u64));
/// assert!(!seen.insert(41));
/// assert!(seen.contains(&41));
/// assert_eq!(seen.len(), 1);
/// ```
pub struct FlatHashSet<K, S = DefaultHashBuilder>
where
    K: Default + Eq,
{
    table: FlatHashTable<SetNode<K>>,
    hash_builder: S,
}

impl<K> FlatHashSet<K, DefaultHashBuilder>
where
    K: Hash + Eq + Default,
{
    /// Creates an empty set. No allocation happens until the first insert.
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Creates an empty set with room for `capacity` keys before any growth.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }
}

impl<K, S> FlatHashSet<K, S>
where
    K: Hash + Eq + Default,
    S: BuildHasher,
{
    /// Creates an empty set using the given hasher builder.
    pub fn with_hasher(hash_builder: S) -> Self {
        FlatHashSet {
            table: FlatHashTable::new(),
            hash_builder,
        }
    }

    /// Creates an empty set with the given capacity and hasher builder.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        let mut set = Self::with_hasher(hash_builder);
        set.reserve(capacity);
        set
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the set holds no keys.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of buckets, zero before the first insert.
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// Returns a reference to the set's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Drops every key and the bucket allocation.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Ensures the set can hold at least `capacity` keys without growing.
    pub fn reserve(&mut self, capacity: usize) {
        let hash_builder = &self.hash_builder;
        self.table
            .reserve(capacity, |key| hash_builder.hash_one(key));
    }

    /// Exchanges the contents of two sets, hasher state included.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Returns `true` if `key` is a member.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flathash::FlatHashSet;
    ///
    /// let mut set = FlatHashSet::new();
    /// set.insert(3u64);
    /// assert!(set.contains(&3));
    /// assert!(!set.contains(&4));
    /// ```
    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Returns a reference to the stored key equal to `key`.
    pub fn get(&self, key: &K) -> Option<&K> {
        if is_empty_key(key) {
            return None;
        }
        let hash = self.hash_builder.hash_one(key);
        let node = self.table.find(hash, |k| k == key)?;
        Some(node.key())
    }

    /// Adds `key` to the set. Returns `true` if it was not already present.
    ///
    /// # Panics
    ///
    /// Panics if `key` is the empty sentinel (the key type's default value).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flathash::FlatHashSet;
    ///
    /// let mut set = FlatHashSet::new();
    /// assert!(set.insert("a"));
    /// assert!(!set.insert("a"));
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn insert(&mut self, key: K) -> bool {
        assert!(
            !is_empty_key(&key),
            "the empty sentinel key cannot be used with FlatHashSet",
        );
        let hash = self.hash_builder.hash_one(&key);
        let hash_builder = &self.hash_builder;
        match self
            .table
            .entry(hash, |k| *k == key, |k| hash_builder.hash_one(k))
        {
            table::Entry::Occupied(_) => false,
            table::Entry::Vacant(entry) => {
                entry.insert(SetNode::new(key));
                true
            }
        }
    }

    /// Removes `key` from the set. Returns `true` if it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        self.take(key).is_some()
    }

    /// Removes `key` from the set, returning the stored key.
    pub fn take(&mut self, key: &K) -> Option<K> {
        if is_empty_key(key) {
            return None;
        }
        let hash = self.hash_builder.hash_one(key);
        let hash_builder = &self.hash_builder;
        let node = self
            .table
            .remove(hash, |k| k == key, |k| hash_builder.hash_one(k))?;
        Some(node.into_key())
    }

    /// Erases every key for which the predicate returns `true`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flathash::FlatHashSet;
    ///
    /// let mut set: FlatHashSet<u64> = (1..=10).collect();
    /// set.remove_if(|key| key % 2 == 0);
    /// assert_eq!(set.len(), 5);
    /// assert!(set.contains(&1));
    /// assert!(!set.contains(&2));
    /// ```
    pub fn remove_if(&mut self, mut f: impl FnMut(&K) -> bool) {
        let hash_builder = &self.hash_builder;
        self.table
            .remove_if(|node| f(node.key()), |k| hash_builder.hash_one(k));
    }

    /// Iterates over all keys in a randomized order.
    ///
    /// The order changes between calls even when the set is not modified;
    /// nothing may rely on it.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            inner: self.table.iter(),
        }
    }
}

impl<K, S> Default for FlatHashSet<K, S>
where
    K: Hash + Eq + Default,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, S> Debug for FlatHashSet<K, S>
where
    K: Debug + Hash + Eq + Default,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, S> Clone for FlatHashSet<K, S>
where
    K: Clone + Hash + Eq + Default,
    S: Clone + BuildHasher,
{
    fn clone(&self) -> Self {
        let table = self
            .table
            .clone_with(|k| self.hash_builder.hash_one(k));
        FlatHashSet {
            table,
            hash_builder: self.hash_builder.clone(),
        }
    }
}

impl<K, S> Extend<K> for FlatHashSet<K, S>
where
    K: Hash + Eq + Default,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K, S> FromIterator<K> for FlatHashSet<K, S>
where
    K: Hash + Eq + Default,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::with_hasher(S::default());
        set.extend(iter);
        set
    }
}

impl<'a, K, S> IntoIterator for &'a FlatHashSet<K, S>
where
    K: Hash + Eq + Default,
    S: BuildHasher,
{
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Randomized-order iterator over set keys.
pub struct Iter<'a, K> {
    inner: table::Iter<'a, SetNode<K>>,
}

impl<K> Clone for Iter<'_, K> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K> Iterator for Iter<'a, K>
where
    K: Default + Eq,
{
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|node| node.key())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: Default + Eq> ExactSizeIterator for Iter<'_, K> {}

impl<K: Default + Eq> core::iter::FusedIterator for Iter<'_, K> {}
