#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

/// A key-value map over the flat hash table.
///
/// This module provides [`FlatHashMap`], which wraps the [`FlatHashTable`]
/// engine with a standard map interface and a configurable hasher.
pub mod map;

/// Bucket node kinds shared by the map and set specializations.
pub mod node;

/// A key-only set over the flat hash table.
///
/// This module provides [`FlatHashSet`], which wraps the [`FlatHashTable`]
/// engine with a standard set interface and a configurable hasher.
pub mod set;

pub mod table;

pub use map::FlatHashMap;
pub use node::is_empty_key;
pub use node::MapNode;
pub use node::Node;
pub use node::SetNode;
pub use set::FlatHashSet;
pub use table::FlatHashTable;

use core::hash::BuildHasher;

use siphasher::sip::SipHasher13;

/// The hasher builder used by [`FlatHashMap`] and [`FlatHashSet`] unless one
/// is supplied.
///
/// Builds an unkeyed SipHash-1-3 hasher. The builder is deterministic: the
/// table's own hash mixer and the randomized iteration start are what guard
/// against degenerate probe behavior, not per-process hasher keys. Use
/// [`with_hasher`](FlatHashMap::with_hasher) to swap in a keyed builder when
/// hash-flooding from untrusted input is a concern.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultHashBuilder;

impl BuildHasher for DefaultHashBuilder {
    type Hasher = SipHasher13;

    fn build_hasher(&self) -> SipHasher13 {
        SipHasher13::new()
    }
}
