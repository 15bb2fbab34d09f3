//! Two-tier cache: memory LRU in front of the disk store.
//!
//! ```text
//! get(key)
//!   │
//!   ├─ L1 MemoryCache hit ──────────────► hits += 1
//!   │
//!   ├─ L2 DiskCache hit ─► warm L1 ─────► hits += 1
//!   │
//!   └─ both miss ───────────────────────► misses += 1
//! ```

use tracing::trace;

use embeddings_types::Embedding;

use crate::disk::DiskCache;
use crate::error::StorageError;
use crate::keys::CacheKey;
use crate::memory::MemoryCache;

/// Read-through, write-through composition of [`MemoryCache`] and [`DiskCache`].
pub struct CombinedCache {
    memory: MemoryCache,
    disk: DiskCache,
    hits: u64,
    misses: u64,
}

impl CombinedCache {
    pub fn new(memory: MemoryCache, disk: DiskCache) -> Self {
        Self {
            memory,
            disk,
            hits: 0,
            misses: 0,
        }
    }

    /// Look up a key in L1, then L2. An L2 hit is copied into L1.
    pub fn get(&mut self, key: &CacheKey) -> Result<Option<Embedding>, StorageError> {
        if let Some(embedding) = self.memory.get(key) {
            self.hits += 1;
            trace!(key = %key, tier = "memory", "Cache hit");
            return Ok(Some(embedding));
        }

        if let Some(embedding) = self.disk.get(key)? {
            self.hits += 1;
            trace!(key = %key, tier = "disk", "Cache hit");
            self.memory.put(key.clone(), embedding.clone());
            return Ok(Some(embedding));
        }

        self.misses += 1;
        Ok(None)
    }

    /// Write to both tiers.
    pub fn put(&mut self, key: CacheKey, embedding: Embedding) -> Result<(), StorageError> {
        self.disk.put(&key, &embedding)?;
        self.memory.put(key, embedding);
        Ok(())
    }

    /// Hits since the last reset
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Misses since the last reset
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Return `(hits, misses)` and zero both counters.
    pub fn take_counts(&mut self) -> (u64, u64) {
        let counts = (self.hits, self.misses);
        self.reset_counters();
        counts
    }

    pub fn reset_counters(&mut self) {
        self.hits = 0;
        self.misses = 0;
    }

    pub fn memory(&self) -> &MemoryCache {
        &self.memory
    }

    pub fn disk(&self) -> &DiskCache {
        &self.disk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key(text: &str) -> CacheKey {
        CacheKey::derive("hashing", 2, text)
    }

    fn vector() -> Embedding {
        Embedding::new(vec![1.0, 1.0])
    }

    fn open(temp: &TempDir, capacity: usize) -> CombinedCache {
        let disk = DiskCache::open(temp.path(), 30).unwrap();
        CombinedCache::new(MemoryCache::new(capacity), disk)
    }

    #[test]
    fn test_miss_then_hit() {
        let temp = TempDir::new().unwrap();
        let mut cache = open(&temp, 4);

        assert!(cache.get(&key("a")).unwrap().is_none());
        cache.put(key("a"), vector()).unwrap();
        assert_eq!(cache.get(&key("a")).unwrap(), Some(vector()));

        assert_eq!(cache.take_counts(), (1, 1));
        assert_eq!((cache.hits(), cache.misses()), (0, 0));
    }

    #[test]
    fn test_put_writes_both_tiers() {
        let temp = TempDir::new().unwrap();
        let mut cache = open(&temp, 4);
        cache.put(key("a"), vector()).unwrap();

        assert!(cache.memory().contains(&key("a")));
        assert_eq!(cache.disk().get(&key("a")).unwrap(), Some(vector()));
    }

    #[test]
    fn test_disk_hit_warms_memory() {
        let temp = TempDir::new().unwrap();
        let mut cache = open(&temp, 1);

        cache.put(key("a"), vector()).unwrap();
        // Evicts "a" from L1; it remains on disk
        cache.put(key("b"), vector()).unwrap();
        assert!(!cache.memory().contains(&key("a")));

        assert_eq!(cache.get(&key("a")).unwrap(), Some(vector()));
        assert!(cache.memory().contains(&key("a")));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 0);
    }

    #[test]
    fn test_disk_tier_survives_new_memory_tier() {
        let temp = TempDir::new().unwrap();
        {
            let mut cache = open(&temp, 4);
            cache.put(key("a"), vector()).unwrap();
        }
        let mut cache = open(&temp, 4);
        assert!(!cache.memory().contains(&key("a")));
        assert_eq!(cache.get(&key("a")).unwrap(), Some(vector()));
    }
}
