//! In-memory LRU tier.

use lru::LruCache;
use std::num::NonZeroUsize;

use embeddings_types::Embedding;

use crate::keys::CacheKey;

/// Bounded least-recently-used map from cache key to vector.
///
/// Both `get` and `put` promote the key to most-recently-used. Once the
/// size would exceed capacity, the single least-recently-used entry is
/// evicted. Not synchronized; callers own it exclusively.
pub struct MemoryCache {
    entries: LruCache<CacheKey, Embedding>,
    evictions: u64,
}

impl MemoryCache {
    /// Create a cache holding at most `capacity` entries (clamped to 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            evictions: 0,
        }
    }

    /// Look up a key, promoting it on hit.
    pub fn get(&mut self, key: &CacheKey) -> Option<Embedding> {
        self.entries.get(key).cloned()
    }

    /// Check for a key without touching recency.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains(key)
    }

    /// Insert or replace an entry.
    pub fn put(&mut self, key: CacheKey, embedding: Embedding) {
        // push returns the replaced entry for an existing key, or the evicted one
        if let Some((old_key, _)) = self.entries.push(key.clone(), embedding) {
            if old_key != key {
                self.evictions += 1;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Number of entries evicted since construction
    pub fn evictions(&self) -> u64 {
        self.evictions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: usize) -> CacheKey {
        CacheKey::derive("hashing", 4, &format!("text-{}", n))
    }

    fn vector(n: usize) -> Embedding {
        Embedding::from_normalized(vec![n as f32, 0.0, 0.0, 0.0])
    }

    #[test]
    fn test_get_miss_has_no_side_effect() {
        let mut cache = MemoryCache::new(2);
        assert!(cache.get(&key(1)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_overflow_evicts_exactly_one_lru() {
        let mut cache = MemoryCache::new(3);
        for n in 0..3 {
            cache.put(key(n), vector(n));
        }
        cache.put(key(3), vector(3));

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.evictions(), 1);
        assert!(!cache.contains(&key(0)));
        for n in 1..4 {
            assert!(cache.contains(&key(n)));
        }
    }

    #[test]
    fn test_access_protects_from_eviction() {
        let mut cache = MemoryCache::new(3);
        for n in 0..3 {
            cache.put(key(n), vector(n));
        }
        // Touch the oldest entry so key(1) becomes the LRU
        assert_eq!(cache.get(&key(0)), Some(vector(0)));
        cache.put(key(3), vector(3));

        assert!(cache.contains(&key(0)));
        assert!(!cache.contains(&key(1)));
        assert_eq!(cache.evictions(), 1);
    }

    #[test]
    fn test_update_existing_key_does_not_evict() {
        let mut cache = MemoryCache::new(2);
        cache.put(key(0), vector(0));
        cache.put(key(1), vector(1));
        cache.put(key(0), vector(7));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.evictions(), 0);
        assert_eq!(cache.get(&key(0)), Some(vector(7)));
    }

    #[test]
    fn test_capacity_clamped_to_one() {
        let mut cache = MemoryCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.put(key(0), vector(0));
        cache.put(key(1), vector(1));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&key(1)));
    }
}
