//! Recency-ordered, byte-bounded cache of derived arrays.
//!
//! Entries are shared [`SharedArray`] handles. An entry whose handle is
//! still held outside the cache is never evicted, so a caller's array stays
//! valid for as long as the caller keeps it; explicit invalidation still
//! drops the cache's own handle.
//!
//! # Complexity
//! `find` and `insert` are `O(log n)` plus the evicted entries.
//! `invalidate` is `O(n)`.
//!
//! # Concurrency
//! No internal locking. Use one cache per worker.

pub mod key;

pub use key::{CacheKey, CacheKeyMask, CacheKind};

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::data::array::SharedArray;
use crate::debug_invariants::{DebugInvariants, ensure};
use crate::mesh_error::MeshIoError;
use crate::topology::cache::InvalidateCache;

#[derive(Debug)]
struct CachedEntry {
    array: SharedArray,
    bytes: usize,
    stamp: u64,
}

/// LRU map from [`CacheKey`] to [`SharedArray`] bounded by approximate bytes.
///
/// Not `Clone`: a copy would hold a second reference to every array and pin
/// all entries in both caches.
#[derive(Debug, Default)]
pub struct ArrayCache {
    entries: BTreeMap<CacheKey, CachedEntry>,
    recency: BTreeMap<u64, CacheKey>,
    clock: u64,
    bytes: usize,
    capacity: usize,
}

static_assertions::assert_impl_all!(ArrayCache: Send, Sync);
static_assertions::assert_not_impl_any!(ArrayCache: Clone);

impl ArrayCache {
    /// Creates a cache holding at most `capacity` bytes; zero means unbounded.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Changes the capacity and evicts down to it.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.evict();
    }

    /// Approximate bytes held.
    pub fn size_bytes(&self) -> usize {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Returns the array cached under `key` and marks it most recently used.
    pub fn find(&mut self, key: &CacheKey) -> Option<SharedArray> {
        let stamp = self.tick();
        let entry = self.entries.get_mut(key)?;
        self.recency.remove(&entry.stamp);
        entry.stamp = stamp;
        self.recency.insert(stamp, *key);
        Some(Arc::clone(&entry.array))
    }

    /// Returns the array cached under `key` without touching recency.
    pub fn peek(&self, key: &CacheKey) -> Option<&SharedArray> {
        self.entries.get(key).map(|e| &e.array)
    }

    /// Stores `array` under `key`, replacing any previous entry, then evicts
    /// least recently used entries that nobody else holds until the cache
    /// fits its capacity.
    pub fn insert(&mut self, key: CacheKey, array: SharedArray) {
        self.remove(&key);
        let stamp = self.tick();
        let bytes = array.byte_size();
        self.entries.insert(
            key,
            CachedEntry {
                array,
                bytes,
                stamp,
            },
        );
        self.recency.insert(stamp, key);
        self.bytes += bytes;
        self.evict();
    }

    /// Removes one entry, returning its array.
    pub fn remove(&mut self, key: &CacheKey) -> Option<SharedArray> {
        let entry = self.entries.remove(key)?;
        self.recency.remove(&entry.stamp);
        self.bytes -= entry.bytes;
        Some(entry.array)
    }

    /// Removes every entry whose key equals `key` on the fields set in `mask`.
    /// Returns the number of entries removed.
    pub fn invalidate(&mut self, key: &CacheKey, mask: CacheKeyMask) -> usize {
        let doomed: Vec<CacheKey> = self
            .entries
            .keys()
            .filter(|k| key.matches(k, mask))
            .copied()
            .collect();
        for k in &doomed {
            self.remove(k);
        }
        if !doomed.is_empty() {
            log::debug!("invalidated {} cached arrays matching {key:?}/{mask:?}", doomed.len());
        }
        doomed.len()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
        self.bytes = 0;
    }

    fn evict(&mut self) {
        if self.capacity == 0 || self.bytes <= self.capacity {
            return;
        }
        let mut excess = self.bytes - self.capacity;
        let mut victims = Vec::new();
        for key in self.recency.values() {
            if excess == 0 {
                break;
            }
            let Some(entry) = self.entries.get(key) else {
                continue;
            };
            if Arc::strong_count(&entry.array) > 1 {
                continue;
            }
            excess = excess.saturating_sub(entry.bytes);
            victims.push(*key);
        }
        for key in &victims {
            self.remove(key);
        }
        if !victims.is_empty() {
            log::debug!(
                "evicted {} arrays, {} of {} bytes in use",
                victims.len(),
                self.bytes,
                self.capacity
            );
        }
    }
}

impl InvalidateCache for ArrayCache {
    fn invalidate_cache(&mut self) {
        self.clear();
    }
}

impl DebugInvariants for ArrayCache {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "ArrayCache");
    }

    fn validate_invariants(&self) -> Result<(), MeshIoError> {
        let total: usize = self.entries.values().map(|e| e.bytes).sum();
        ensure(total == self.bytes, || {
            format!("size accounting drifted: {} tracked, {total} held", self.bytes)
        })?;
        ensure(self.recency.len() == self.entries.len(), || {
            format!(
                "{} recency stamps for {} entries",
                self.recency.len(),
                self.entries.len()
            )
        })?;
        for (stamp, key) in &self.recency {
            ensure(
                self.entries.get(key).map(|e| e.stamp) == Some(*stamp),
                || format!("stale recency stamp {stamp} for {key:?}"),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::array::DataArray;

    fn arr(n: usize) -> SharedArray {
        Arc::new(DataArray::float("", 1, vec![0.0; n]))
    }

    fn key(i: i64) -> CacheKey {
        CacheKey::new(-1, CacheKind::NodalCoords, 0, i)
    }

    #[test]
    fn find_returns_inserted_array() {
        let mut cache = ArrayCache::new(0);
        let a = arr(4);
        cache.insert(key(0), Arc::clone(&a));
        assert!(Arc::ptr_eq(&cache.find(&key(0)).unwrap(), &a));
        assert!(cache.find(&key(1)).is_none());
        cache.validate_invariants().unwrap();
    }

    #[test]
    fn reinsert_replaces_and_refreshes() {
        let mut cache = ArrayCache::new(0);
        cache.insert(key(0), arr(4));
        cache.insert(key(0), arr(8));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.size_bytes(), 64);
        cache.validate_invariants().unwrap();
    }

    #[test]
    fn evicts_least_recently_used() {
        // Each array is 80 bytes.
        let mut cache = ArrayCache::new(200);
        cache.insert(key(0), arr(10));
        cache.insert(key(1), arr(10));
        let _ = cache.find(&key(0));
        cache.insert(key(2), arr(10));
        assert!(cache.contains(&key(0)));
        assert!(!cache.contains(&key(1)));
        assert!(cache.contains(&key(2)));
        assert!(cache.size_bytes() <= 200);
    }

    #[test]
    fn held_entries_survive_eviction() {
        let mut cache = ArrayCache::new(100);
        let held = arr(10);
        cache.insert(key(0), Arc::clone(&held));
        cache.insert(key(1), arr(10));
        assert!(cache.contains(&key(0)));
        assert!(!cache.contains(&key(1)));
        drop(held);
        cache.set_capacity(50);
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_by_mask() {
        let mut cache = ArrayCache::new(0);
        for t in 0..3 {
            cache.insert(CacheKey::new(t, CacheKind::NodalCoords, 0, 0), arr(1));
            cache.insert(CacheKey::new(t, CacheKind::ObjectId, 0, 0), arr(1));
        }
        let probe = CacheKey::new(0, CacheKind::NodalCoords, 0, 0);
        assert_eq!(cache.invalidate(&probe, CacheKeyMask::KIND), 3);
        assert_eq!(cache.len(), 3);
        assert!(cache.find(&CacheKey::new(2, CacheKind::NodalCoords, 0, 0)).is_none());
        cache.validate_invariants().unwrap();
    }
}
