//! Hash-backed containers shared by the element model and host adapters.
//!
//! The default build uses `hashbrown` with `ahash`; enabling `std-hash`
//! swaps both for the standard library equivalents.

use indexmap::IndexMap;

#[cfg(not(feature = "std-hash"))]
pub type BuildHasher = ahash::RandomState;

#[cfg(feature = "std-hash")]
pub type BuildHasher = std::collections::hash_map::RandomState;

#[cfg(not(feature = "std-hash"))]
pub type HashMap<K, V> = hashbrown::HashMap<K, V, BuildHasher>;

#[cfg(feature = "std-hash")]
pub type HashMap<K, V> = std::collections::HashMap<K, V, BuildHasher>;

/// Insertion-ordered map. Property maps use it so that host calls are issued
/// in the order properties were declared.
pub type OrderedMap<K, V> = IndexMap<K, V, BuildHasher>;
