//! Concurrent storage for rate-limited patterns.
//!
//! Provides the sharded map behind the pattern cache and the registry's
//! per-period member sets.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::borrow::Borrow;
use std::hash::Hash;

/// Thread-safe sharded storage backed by DashMap.
///
/// DashMap provides lock-free reads and fine-grained locking for writes,
/// making it suitable for lookups on every logging call.
#[derive(Debug)]
pub struct ShardedStorage<K, V>
where
    K: Eq + Hash,
{
    map: DashMap<K, V, ahash::RandomState>,
}

impl<K, V> ShardedStorage<K, V>
where
    K: Eq + Hash,
{
    /// Create a new sharded storage instance.
    pub fn new() -> Self {
        Self {
            map: DashMap::with_hasher(ahash::RandomState::new()),
        }
    }

    /// Get a clone of the value stored under `key`.
    ///
    /// The shard guard is released before returning.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.map.get(key).map(|entry| entry.value().clone())
    }

    /// Insert `value` unless `key` is already present.
    ///
    /// Returns the value that ends up stored and whether it was `value`.
    /// When another caller got there first, `value` is dropped.
    pub fn insert_if_absent(&self, key: K, value: V) -> (V, bool)
    where
        V: Clone,
    {
        match self.map.entry(key) {
            Entry::Occupied(existing) => (existing.get().clone(), false),
            Entry::Vacant(slot) => {
                slot.insert(value.clone());
                (value, true)
            }
        }
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the storage is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.map.clear();
    }

    /// Clone out every value.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.map.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Remove every entry, returning the removed values.
    ///
    /// Each shard is emptied under its own write lock.
    pub fn drain(&self) -> Vec<V>
    where
        V: Clone,
    {
        let mut drained = Vec::with_capacity(self.map.len());
        self.map.retain(|_, value| {
            drained.push(value.clone());
            false
        });
        drained
    }
}

impl<K, V> Default for ShardedStorage<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}
