//! Storage layer for the embeddings service.
//!
//! Two cache tiers keyed by [`CacheKey`]:
//! - [`MemoryCache`]: bounded LRU (L1, volatile)
//! - [`DiskCache`]: RocksDB with per-entry timestamps and lazy TTL expiry (L2, durable)
//!
//! [`CombinedCache`] composes both with read-through warming and
//! write-through puts, and counts hits and misses.
//!
//! A disk cache owns its directory exclusively. Two processes pointed at
//! the same path are not guarded against.

pub mod column_families;
pub mod combined;
pub mod disk;
pub mod error;
pub mod keys;
pub mod memory;

pub use combined::CombinedCache;
pub use disk::DiskCache;
pub use error::StorageError;
pub use keys::{CacheKey, TimeIndexKey};
pub use memory::MemoryCache;
