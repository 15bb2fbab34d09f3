//! RocksDB-backed durable cache tier.
//!
//! Provides:
//! - Idempotent open with column family setup
//! - Atomic upsert of vector + timestamp + time index via WriteBatch
//! - Lazy TTL expiry on lookup, plus an optional index-driven sweep
//! - Silent purge of corrupted entries
//!
//! I/O failures are returned to the caller. Corruption and expiry are
//! not: both resolve to a miss.

use chrono::Utc;
use rocksdb::{ColumnFamily, IteratorMode, Options, WriteBatch, DB};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use embeddings_types::config::ttl_days_to_secs;
use embeddings_types::Embedding;

use crate::column_families::{
    build_cf_descriptors, ALL_CF_NAMES, CF_BY_TIME, CF_EMBEDDINGS, CF_TIMESTAMPS,
};
use crate::error::StorageError;
use crate::keys::{CacheKey, TimeIndexKey};

/// Directory name of the store inside the configured cache directory
pub const STORE_DIR_NAME: &str = "embeddings.db";

/// Durable key -> vector store with per-entry timestamps.
pub struct DiskCache {
    db: DB,
    path: PathBuf,
    ttl_secs: Option<i64>,
}

impl DiskCache {
    /// Open the store inside `cache_dir`, creating it if necessary.
    ///
    /// `ttl_days < 0` disables expiry.
    pub fn open(cache_dir: impl AsRef<Path>, ttl_days: i64) -> Result<Self, StorageError> {
        let path = cache_dir.as_ref().join(STORE_DIR_NAME);
        std::fs::create_dir_all(cache_dir.as_ref())?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let db = DB::open_cf_descriptors(&opts, &path, build_cf_descriptors())?;
        let ttl_secs = ttl_days_to_secs(ttl_days);

        info!(path = ?path, ttl_secs = ?ttl_secs, "Opened embedding disk cache");
        Ok(Self { db, path, ttl_secs })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(name.to_string()))
    }

    /// Look up a vector at the current wall-clock time.
    pub fn get(&self, key: &CacheKey) -> Result<Option<Embedding>, StorageError> {
        self.get_at(key, Utc::now().timestamp())
    }

    /// Look up a vector as of `now_secs`.
    ///
    /// Expired or unreadable entries are deleted and reported as absent.
    pub fn get_at(&self, key: &CacheKey, now_secs: i64) -> Result<Option<Embedding>, StorageError> {
        let Some(value) = self.db.get_cf(self.cf(CF_EMBEDDINGS)?, key.as_bytes())? else {
            return Ok(None);
        };

        let timestamp = self
            .db
            .get_cf(self.cf(CF_TIMESTAMPS)?, key.as_bytes())?
            .and_then(|bytes| decode_timestamp(&bytes));

        let Some(timestamp) = timestamp else {
            warn!(key = %key, "Cache entry has no readable timestamp, purging");
            self.remove(key, None)?;
            return Ok(None);
        };

        if let Some(ttl) = self.ttl_secs {
            let age = now_secs.saturating_sub(timestamp);
            if age > ttl {
                debug!(key = %key, age, "Cache entry expired");
                self.remove(key, Some(timestamp))?;
                return Ok(None);
            }
        }

        match serde_json::from_slice::<Vec<f32>>(&value) {
            Ok(values) => Ok(Some(Embedding::from_normalized(values))),
            Err(e) => {
                warn!(key = %key, error = %e, "Corrupted cache entry, purging");
                self.remove(key, Some(timestamp))?;
                Ok(None)
            }
        }
    }

    /// Upsert a vector stamped with the current wall-clock time.
    pub fn put(&self, key: &CacheKey, embedding: &Embedding) -> Result<(), StorageError> {
        self.put_at(key, embedding, Utc::now().timestamp())
    }

    /// Upsert a vector stamped with `timestamp_secs`.
    pub fn put_at(
        &self,
        key: &CacheKey,
        embedding: &Embedding,
        timestamp_secs: i64,
    ) -> Result<(), StorageError> {
        let embeddings_cf = self.cf(CF_EMBEDDINGS)?;
        let timestamps_cf = self.cf(CF_TIMESTAMPS)?;
        let by_time_cf = self.cf(CF_BY_TIME)?;

        let value = serde_json::to_vec(&embedding.values)?;

        let mut batch = WriteBatch::default();

        // Drop the index row of the entry being replaced
        if let Some(previous) = self
            .db
            .get_cf(timestamps_cf, key.as_bytes())?
            .and_then(|bytes| decode_timestamp(&bytes))
        {
            batch.delete_cf(by_time_cf, TimeIndexKey::new(previous, key.clone()).to_bytes());
        }

        batch.put_cf(embeddings_cf, key.as_bytes(), value);
        batch.put_cf(timestamps_cf, key.as_bytes(), timestamp_secs.to_be_bytes());
        batch.put_cf(
            by_time_cf,
            TimeIndexKey::new(timestamp_secs, key.clone()).to_bytes(),
            b"",
        );

        self.db.write(batch)?;
        debug!(key = %key, dim = embedding.dimension(), "Stored cache entry");
        Ok(())
    }

    /// Delete every entry older than the TTL as of the current time.
    pub fn purge_expired(&self) -> Result<usize, StorageError> {
        self.purge_expired_at(Utc::now().timestamp())
    }

    /// Delete every entry older than the TTL as of `now_secs`.
    ///
    /// Walks the time index in order and stops at the first live entry.
    /// Returns the number of entries removed; always 0 without a TTL.
    pub fn purge_expired_at(&self, now_secs: i64) -> Result<usize, StorageError> {
        let Some(ttl) = self.ttl_secs else {
            return Ok(0);
        };

        let by_time_cf = self.cf(CF_BY_TIME)?;
        // Expired means age > ttl, i.e. timestamp < now - ttl
        let end = TimeIndexKey::prefix_before(now_secs.saturating_sub(ttl));

        let mut batch = WriteBatch::default();
        let mut purged = 0;

        for item in self.db.iterator_cf(by_time_cf, IteratorMode::Start) {
            let (index_key, _) = item?;
            if index_key.as_ref() >= end.as_slice() {
                break;
            }
            match TimeIndexKey::from_bytes(&index_key) {
                Ok(entry) => {
                    batch.delete_cf(self.cf(CF_EMBEDDINGS)?, entry.key.as_bytes());
                    batch.delete_cf(self.cf(CF_TIMESTAMPS)?, entry.key.as_bytes());
                    purged += 1;
                }
                Err(e) => warn!(error = %e, "Dropping unreadable time index row"),
            }
            batch.delete_cf(by_time_cf, &index_key);
        }

        self.db.write(batch)?;
        if purged > 0 {
            info!(purged, "Purged expired cache entries");
        }
        Ok(purged)
    }

    /// Count stored entries
    pub fn len(&self) -> Result<usize, StorageError> {
        let iter = self
            .db
            .iterator_cf(self.cf(CF_EMBEDDINGS)?, IteratorMode::Start);
        let mut count = 0;
        for item in iter {
            item?;
            count += 1;
        }
        Ok(count)
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        let mut iter = self
            .db
            .iterator_cf(self.cf(CF_EMBEDDINGS)?, IteratorMode::Start);
        match iter.next() {
            Some(item) => {
                item?;
                Ok(false)
            }
            None => Ok(true),
        }
    }

    /// Remove every entry from every column family
    pub fn clear(&self) -> Result<(), StorageError> {
        let mut batch = WriteBatch::default();
        for name in ALL_CF_NAMES {
            let cf = self.cf(name)?;
            for item in self.db.iterator_cf(cf, IteratorMode::Start) {
                let (key, _) = item?;
                batch.delete_cf(cf, key);
            }
        }
        self.db.write(batch)?;
        info!(path = ?self.path, "Cleared embedding disk cache");
        Ok(())
    }

    fn remove(&self, key: &CacheKey, timestamp: Option<i64>) -> Result<(), StorageError> {
        let mut batch = WriteBatch::default();
        batch.delete_cf(self.cf(CF_EMBEDDINGS)?, key.as_bytes());
        batch.delete_cf(self.cf(CF_TIMESTAMPS)?, key.as_bytes());
        if let Some(ts) = timestamp {
            batch.delete_cf(self.cf(CF_BY_TIME)?, TimeIndexKey::new(ts, key.clone()).to_bytes());
        }
        self.db.write(batch)?;
        Ok(())
    }

    /// Overwrite the raw vector payload of an entry (corruption tests only).
    #[cfg(test)]
    fn put_raw_value(&self, key: &CacheKey, raw: &[u8]) -> Result<(), StorageError> {
        self.db.put_cf(self.cf(CF_EMBEDDINGS)?, key.as_bytes(), raw)?;
        Ok(())
    }
}

fn decode_timestamp(bytes: &[u8]) -> Option<i64> {
    let array: [u8; 8] = bytes.try_into().ok()?;
    Some(i64::from_be_bytes(array))
}
