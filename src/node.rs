//! Bucket storage for the flat hash table.
//!
//! A bucket holds exactly one [`Node`]. Occupancy is encoded inside the node
//! itself: a bucket is vacant if and only if its key equals the key type's
//! default value (the *empty sentinel*). There is no side-table of occupancy
//! bits, which keeps a bucket exactly as large as its payload.
//!
//! Two node kinds exist: [`MapNode`] carries a key plus a value whose storage
//! is raw ([`MaybeUninit`]) while the bucket is vacant, and [`SetNode`]
//! carries a key alone. The table engine is generic over the kind through the
//! [`Node`] trait.

use core::fmt::Debug;
use core::mem;
use core::mem::MaybeUninit;

/// Returns `true` if `key` equals the reserved empty sentinel, i.e. the key
/// type's default value.
///
/// The sentinel is what marks a bucket as vacant, so it can never be stored
/// as a live key: for integers that rules out `0`, for strings the empty
/// string. Upholding this is the caller's side of the container contract.
#[inline(always)]
pub fn is_empty_key<K: Default + Eq>(key: &K) -> bool {
    *key == K::default()
}

mod sealed {
    pub trait Sealed {}

    impl<K, V> Sealed for super::MapNode<K, V> {}
    impl<K> Sealed for super::SetNode<K> {}
}

/// One bucket's worth of storage, either vacant or occupied.
///
/// The trait is sealed: the table engine's bookkeeping relies on the sentinel
/// encoding of these two kinds, and a foreign implementation could not uphold
/// it.
pub trait Node: sealed::Sealed + Sized {
    /// Key type; its default value is reserved as the empty sentinel.
    type Key: Default + Eq;

    /// Creates a vacant node.
    fn vacant() -> Self;

    /// The node's key. Equals the sentinel exactly when the node is vacant.
    fn key(&self) -> &Self::Key;

    /// Returns `true` if this node holds no entry.
    #[inline(always)]
    fn is_vacant(&self) -> bool {
        is_empty_key(self.key())
    }

    /// Moves the live contents out, leaving the node vacant in place.
    ///
    /// # Safety
    ///
    /// The node must be occupied.
    unsafe fn take(&mut self) -> Self;

    /// Drops the live contents, returning the node to the vacant state.
    ///
    /// # Safety
    ///
    /// The node must be occupied.
    unsafe fn reset(&mut self);
}

/// Key-value node. The value storage is uninitialized raw memory while the
/// node is vacant; only the key field is meaningful then.
pub struct MapNode<K, V> {
    key: K,
    value: MaybeUninit<V>,
}

impl<K, V> MapNode<K, V>
where
    K: Default + Eq,
{
    /// Creates an occupied node from a key-value pair.
    ///
    /// `key` must not be the empty sentinel.
    #[inline]
    pub fn new(key: K, value: V) -> Self {
        debug_assert!(!is_empty_key(&key));
        MapNode {
            key,
            value: MaybeUninit::new(value),
        }
    }

    /// Borrows the value.
    ///
    /// # Safety
    ///
    /// The node must be occupied.
    #[inline(always)]
    pub unsafe fn value(&self) -> &V {
        debug_assert!(!self.is_vacant());
        // SAFETY: occupied nodes always hold an initialized value.
        unsafe { self.value.assume_init_ref() }
    }

    /// Mutably borrows the value.
    ///
    /// # Safety
    ///
    /// The node must be occupied.
    #[inline(always)]
    pub unsafe fn value_mut(&mut self) -> &mut V {
        debug_assert!(!self.is_vacant());
        // SAFETY: occupied nodes always hold an initialized value.
        unsafe { self.value.assume_init_mut() }
    }

    /// Borrows the key and value together.
    ///
    /// # Safety
    ///
    /// The node must be occupied.
    #[inline(always)]
    pub unsafe fn key_value(&self) -> (&K, &V) {
        debug_assert!(!self.is_vacant());
        // SAFETY: occupied nodes always hold an initialized value.
        (&self.key, unsafe { self.value.assume_init_ref() })
    }

    /// Borrows the key and mutably borrows the value.
    ///
    /// The key stays shared: rewriting it would detach the entry from its
    /// home bucket.
    ///
    /// # Safety
    ///
    /// The node must be occupied.
    #[inline(always)]
    pub unsafe fn key_value_mut(&mut self) -> (&K, &mut V) {
        debug_assert!(!self.is_vacant());
        // SAFETY: occupied nodes always hold an initialized value.
        (&self.key, unsafe { self.value.assume_init_mut() })
    }

    /// Consumes the node, returning the key-value pair.
    ///
    /// # Safety
    ///
    /// The node must be occupied.
    #[inline]
    pub unsafe fn into_parts(self) -> (K, V) {
        debug_assert!(!self.is_vacant());
        let MapNode { key, value } = self;
        // SAFETY: occupied nodes always hold an initialized value, and `self`
        // is consumed so the value cannot be read twice.
        (key, unsafe { value.assume_init_read() })
    }
}

impl<K, V> Node for MapNode<K, V>
where
    K: Default + Eq,
{
    type Key = K;

    #[inline(always)]
    fn vacant() -> Self {
        MapNode {
            key: K::default(),
            value: MaybeUninit::uninit(),
        }
    }

    #[inline(always)]
    fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    unsafe fn take(&mut self) -> Self {
        debug_assert!(!self.is_vacant());
        let key = mem::take(&mut self.key);
        // SAFETY: the node was occupied, and replacing the key with the
        // sentinel above marks it vacant, so the value is never read again
        // through `self`.
        let value = unsafe { self.value.assume_init_read() };
        MapNode {
            key,
            value: MaybeUninit::new(value),
        }
    }

    #[inline]
    unsafe fn reset(&mut self) {
        debug_assert!(!self.is_vacant());
        self.key = K::default();
        // SAFETY: the node was occupied; the sentinel key now marks the value
        // storage as dead, so dropping it here is the only drop.
        unsafe { self.value.assume_init_drop() };
    }
}

impl<K, V> Clone for MapNode<K, V>
where
    K: Clone + Default + Eq,
    V: Clone,
{
    fn clone(&self) -> Self {
        if self.is_vacant() {
            Self::vacant()
        } else {
            MapNode {
                key: self.key.clone(),
                // SAFETY: occupied nodes always hold an initialized value.
                value: MaybeUninit::new(unsafe { self.value.assume_init_ref() }.clone()),
            }
        }
    }
}

impl<K, V> Debug for MapNode<K, V>
where
    K: Debug + Default + Eq,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_vacant() {
            f.debug_struct("MapNode").field("key", &self.key).finish_non_exhaustive()
        } else {
            // SAFETY: occupied nodes always hold an initialized value.
            let value = unsafe { self.value.assume_init_ref() };
            f.debug_struct("MapNode")
                .field("key", &self.key)
                .field("value", value)
                .finish()
        }
    }
}

/// Key-only node.
#[derive(Clone, Debug)]
pub struct SetNode<K> {
    key: K,
}

impl<K> SetNode<K>
where
    K: Default + Eq,
{
    /// Creates an occupied node from a key.
    ///
    /// `key` must not be the empty sentinel.
    #[inline]
    pub fn new(key: K) -> Self {
        debug_assert!(!is_empty_key(&key));
        SetNode { key }
    }

    /// Consumes the node, returning the key.
    #[inline]
    pub fn into_key(self) -> K {
        self.key
    }
}

impl<K> Node for SetNode<K>
where
    K: Default + Eq,
{
    type Key = K;

    #[inline(always)]
    fn vacant() -> Self {
        SetNode { key: K::default() }
    }

    #[inline(always)]
    fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    unsafe fn take(&mut self) -> Self {
        debug_assert!(!self.is_vacant());
        SetNode {
            key: mem::take(&mut self.key),
        }
    }

    #[inline]
    unsafe fn reset(&mut self) {
        debug_assert!(!self.is_vacant());
        self.key = K::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_marks_vacancy() {
        let node: MapNode<u64, String> = MapNode::vacant();
        assert!(node.is_vacant());
        assert!(is_empty_key(node.key()));

        let node = MapNode::new(7u64, "seven".to_string());
        assert!(!node.is_vacant());
        assert_eq!(*node.key(), 7);
    }

    #[test]
    fn take_leaves_vacant() {
        let mut node = MapNode::new(3u64, vec![1, 2, 3]);
        // SAFETY: the node is occupied.
        let moved = unsafe { node.take() };
        assert!(node.is_vacant());
        assert!(!moved.is_vacant());
        // SAFETY: `moved` carries the live entry now.
        let (key, value) = unsafe { moved.into_parts() };
        assert_eq!(key, 3);
        assert_eq!(value, vec![1, 2, 3]);
    }

    #[test]
    fn reset_drops_value() {
        let mut node = MapNode::new(1u64, "payload".to_string());
        // SAFETY: the node is occupied.
        unsafe { node.reset() };
        assert!(node.is_vacant());
    }

    #[test]
    fn set_node_round_trip() {
        let mut node = SetNode::new("alpha".to_string());
        assert!(!node.is_vacant());
        // SAFETY: the node is occupied.
        let moved = unsafe { node.take() };
        assert!(node.is_vacant());
        assert_eq!(moved.into_key(), "alpha");
    }
}
