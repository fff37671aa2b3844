//! String-keyed map for write-heavy workloads.
//!
//! Single-key access (`set`, `get`, `remove`) and batch writes take the
//! exclusive lock; bulk reads take the shared lock and hand back an owned
//! snapshot, so the caller's view stays stable while writers continue.
//! Read-heavy workloads are better served by a read-optimized concurrent map.

use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// Capacity hint used when none (or zero) is given.
pub const DEFAULT_MAP_CAPACITY: usize = 32;

/// Configuration for a [`ConcurrentMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
    /// Number of entries to pre-size for.
    pub initial_capacity: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_MAP_CAPACITY,
        }
    }
}

/// Concurrent `String -> V` map guarded by one reader/writer lock.
///
/// There is no eviction: every key written stays until removed.
pub struct ConcurrentMap<V> {
    items: RwLock<HashMap<String, V>>,
}

impl<V> ConcurrentMap<V> {
    /// Creates a map pre-sized for [`DEFAULT_MAP_CAPACITY`] entries.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAP_CAPACITY)
    }

    /// Creates a map pre-sized for `capacity` entries (0 picks the default).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_MAP_CAPACITY
        } else {
            capacity
        };
        Self {
            items: RwLock::new(HashMap::with_capacity(capacity)),
        }
    }

    /// Creates a map from configuration.
    #[must_use]
    pub fn from_config(config: &MapConfig) -> Self {
        Self::with_capacity(config.initial_capacity)
    }

    /// Inserts or overwrites `key`.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.items.write().insert(key.into(), value);
    }

    /// Inserts every entry of `entries` as one atomic batch.
    ///
    /// No reader observes part of the batch.
    pub fn set_many<I, K>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        // Convert keys before taking the lock.
        let entries: Vec<(String, V)> = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value))
            .collect();
        let mut items = self.items.write();
        items.reserve(entries.len());
        items.extend(entries);
    }

    /// Removes `key`, returning its value if present.
    pub fn remove(&self, key: &str) -> Option<V> {
        self.items.write().remove(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Returns true if the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl<V: Clone> ConcurrentMap<V> {
    /// Returns a copy of the value stored under `key`.
    ///
    /// Takes the exclusive lock: in the workloads this map targets, lookups
    /// interleave with a stream of writes and gain nothing from sharing.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        self.items.write().get(key).cloned()
    }

    /// Returns a snapshot of the requested keys that are present.
    ///
    /// Absent keys are omitted, not defaulted.
    #[must_use]
    pub fn get_many<I, K>(&self, keys: I) -> HashMap<String, V>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let keys = keys.into_iter();
        let items = self.items.read();
        let mut found = HashMap::with_capacity(keys.size_hint().0.min(items.len()));
        for key in keys {
            let key = key.as_ref();
            if let Some(value) = items.get(key) {
                found.insert(key.to_owned(), value.clone());
            }
        }
        found
    }

    /// Returns a snapshot of every entry.
    #[must_use]
    pub fn dump_all(&self) -> HashMap<String, V> {
        self.items.read().clone()
    }
}

impl<V> Default for ConcurrentMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for ConcurrentMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentMap")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn last_write_wins() {
        let map = ConcurrentMap::new();
        map.set("k", "v1");
        map.set("k", "v2");
        assert_eq!(map.get("k"), Some("v2"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn get_many_omits_absent_keys() {
        let map = ConcurrentMap::new();
        map.set("a", 1);
        let found = map.get_many(["a", "b"]);
        assert_eq!(found.len(), 1);
        assert_eq!(found.get("a"), Some(&1));
        assert!(!found.contains_key("b"));
    }

    #[test]
    fn zero_capacity_falls_back_to_default() {
        let map: ConcurrentMap<u8> = ConcurrentMap::with_capacity(0);
        assert!(map.items.read().capacity() >= DEFAULT_MAP_CAPACITY);
        assert!(map.is_empty());
    }

    #[test]
    fn snapshots_are_independent_of_later_writes() {
        let map = ConcurrentMap::new();
        map.set_many([("a", 1), ("b", 2)]);
        let snapshot = map.dump_all();
        map.set("a", 10);
        map.set("c", 3);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["a"], 1);
        assert_eq!(map.get("a"), Some(10));
    }

    #[test]
    fn remove_returns_previous_value() {
        let map = ConcurrentMap::new();
        map.set("gone", 'x');
        assert_eq!(map.remove("gone"), Some('x'));
        assert_eq!(map.remove("gone"), None);
        assert_eq!(map.get("gone"), None);
    }

    #[test]
    fn batches_are_never_observed_partially() {
        const BATCH: usize = 64;
        let map = Arc::new(ConcurrentMap::new());
        let start = Arc::new(Barrier::new(2));

        let writer = {
            let map = Arc::clone(&map);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                for round in 0..200_u32 {
                    map.set_many((0..BATCH).map(|i| (format!("key-{i}"), round)));
                }
            })
        };

        start.wait();
        for _ in 0..200 {
            let snapshot = map.dump_all();
            if snapshot.is_empty() {
                continue;
            }
            assert_eq!(snapshot.len(), BATCH);
            let first = snapshot["key-0"];
            assert!(snapshot.values().all(|round| *round == first));
        }
        writer.join().expect("writer thread");
    }
}
