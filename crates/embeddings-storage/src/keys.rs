//! Key encoding for the cache tiers.
//!
//! Cache key: lowercase hex SHA-256 over `{backend}\x1f{dim}\x1f{trimmed text}`.
//! Backend and dimensionality are part of the digest input, so switching
//! either one never reads entries written under the other.
//!
//! Time index key: `{timestamp_secs:020}:{cache_key}`, zero-padded so
//! lexicographic order matches chronological order.

use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::StorageError;

/// Field separator inside the digest input (ASCII unit separator)
const KEY_SEPARATOR: u8 = 0x1f;

/// Length of an encoded cache key in bytes
pub const CACHE_KEY_LEN: usize = 64;

/// Opaque, fixed-length key shared by both cache tiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for `text` embedded by `backend` at `dim` dimensions.
    pub fn derive(backend: &str, dim: usize, text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(backend.as_bytes());
        hasher.update([KEY_SEPARATOR]);
        hasher.update(dim.to_string().as_bytes());
        hasher.update([KEY_SEPARATOR]);
        hasher.update(normalize_text(text).as_bytes());
        let digest = hasher.finalize();

        let mut hex = String::with_capacity(CACHE_KEY_LEN);
        for byte in digest {
            hex.push_str(&format!("{:02x}", byte));
        }
        Self(hex)
    }

    /// Rebuild a key read back from storage.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;
        if s.len() != CACHE_KEY_LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(StorageError::Key(format!("Invalid cache key: {}", s)));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Text normalization applied before hashing.
pub fn normalize_text(text: &str) -> &str {
    text.trim()
}

/// Key for the timestamp index
/// Format: {timestamp_secs:020}:{cache_key}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeIndexKey {
    /// Insertion time in seconds since the Unix epoch
    pub timestamp_secs: i64,
    /// Indexed cache key
    pub key: CacheKey,
}

impl TimeIndexKey {
    pub fn new(timestamp_secs: i64, key: CacheKey) -> Self {
        Self {
            timestamp_secs,
            key,
        }
    }

    /// Encode key to bytes. Pre-epoch timestamps sort as zero.
    pub fn to_bytes(&self) -> Vec<u8> {
        format!("{:020}:{}", self.timestamp_secs.max(0), self.key).into_bytes()
    }

    /// Decode key from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;

        let (ts, key) = s
            .split_once(':')
            .ok_or_else(|| StorageError::Key(format!("Invalid time index key: {}", s)))?;

        let timestamp_secs: i64 = ts
            .parse()
            .map_err(|e| StorageError::Key(format!("Invalid timestamp: {}", e)))?;
        let key = CacheKey::from_bytes(key.as_bytes())?;

        Ok(Self {
            timestamp_secs,
            key,
        })
    }

    /// Exclusive upper bound for a scan over entries older than `timestamp_secs`.
    pub fn prefix_before(timestamp_secs: i64) -> Vec<u8> {
        format!("{:020}:", timestamp_secs.max(0)).into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_fixed_length_hex() {
        let key = CacheKey::derive("hashing", 384, "hello world");
        assert_eq!(key.as_str().len(), CACHE_KEY_LEN);
        assert!(key.as_str().bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_cache_key_deterministic() {
        let a = CacheKey::derive("hashing", 384, "hello world");
        let b = CacheKey::derive("hashing", 384, "hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn test_cache_key_includes_backend_and_dim() {
        let base = CacheKey::derive("hashing", 384, "hello");
        assert_ne!(base, CacheKey::derive("numeric:minilm", 384, "hello"));
        assert_ne!(base, CacheKey::derive("hashing", 128, "hello"));
    }

    #[test]
    fn test_cache_key_separator_prevents_ambiguity() {
        // "hashing1" + dim 28 must not collide with "hashing" + dim 128
        let a = CacheKey::derive("hashing1", 28, "x");
        let b = CacheKey::derive("hashing", 128, "x");
        assert_ne!(a, b);
    }

    #[test]
    fn test_cache_key_trims_whitespace() {
        let a = CacheKey::derive("hashing", 64, "  spaced out\n");
        let b = CacheKey::derive("hashing", 64, "spaced out");
        assert_eq!(a, b);
    }

    #[test]
    fn test_cache_key_from_bytes_rejects_garbage() {
        assert!(CacheKey::from_bytes(b"not-a-key").is_err());
        let key = CacheKey::derive("hashing", 8, "a");
        assert_eq!(CacheKey::from_bytes(key.as_bytes()).unwrap(), key);
    }

    #[test]
    fn test_time_index_key_roundtrip() {
        let key = TimeIndexKey::new(1_706_540_400, CacheKey::derive("hashing", 8, "a"));
        let decoded = TimeIndexKey::from_bytes(&key.to_bytes()).unwrap();
        assert_eq!(key, decoded);
    }

    #[test]
    fn test_time_index_key_lexicographic_order() {
        let cache_key = CacheKey::derive("hashing", 8, "a");
        let key1 = TimeIndexKey::new(999, cache_key.clone());
        let key2 = TimeIndexKey::new(1_000, cache_key);
        assert!(key1.to_bytes() < key2.to_bytes());
        assert!(key1.to_bytes() < TimeIndexKey::prefix_before(1_000));
    }
}
