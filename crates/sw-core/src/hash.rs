//! Fast hash map and hash set type aliases.
//!
//! Watch sets and import graphs are keyed by paths, so every lookup hashes a
//! string. The Fx hash from `rustc-hash` is noticeably faster than SipHash for
//! these keys and denial-of-service resistance is not a concern for local
//! filesystem paths.
//!
//! # Examples
//!
//! ```
//! use sw_core::{FxHashMap, FxHashSet, fx_hash_map, fx_hash_set};
//!
//! let mut map: FxHashMap<String, i32> = FxHashMap::default();
//! map.insert("key".to_owned(), 42);
//!
//! let map: FxHashMap<&str, i32> = fx_hash_map();
//! let set: FxHashSet<&str> = fx_hash_set();
//! ```

/// A [`HashMap`](std::collections::HashMap) using the Fx hash algorithm.
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// A [`HashSet`](std::collections::HashSet) using the Fx hash algorithm.
pub type FxHashSet<V> = rustc_hash::FxHashSet<V>;

/// Creates a new empty [`FxHashMap`].
///
/// # Examples
///
/// ```
/// use sw_core::fx_hash_map;
///
/// let map: sw_core::FxHashMap<String, i32> = fx_hash_map();
/// assert!(map.is_empty());
/// ```
#[inline]
#[must_use]
pub fn fx_hash_map<K, V>() -> FxHashMap<K, V> {
    FxHashMap::default()
}

/// Creates a new empty [`FxHashSet`].
///
/// # Examples
///
/// ```
/// use sw_core::fx_hash_set;
///
/// let set: sw_core::FxHashSet<String> = fx_hash_set();
/// assert!(set.is_empty());
/// ```
#[inline]
#[must_use]
pub fn fx_hash_set<V>() -> FxHashSet<V> {
    FxHashSet::default()
}
