//! Column family definitions for the disk cache.
//!
//! - embeddings: cache key -> compact JSON array of f32
//! - timestamps: cache key -> insertion time (big-endian i64 epoch seconds)
//! - by_time: `{ts:020}:{key}` -> empty, secondary index for expiry sweeps

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family name for serialized vectors
pub const CF_EMBEDDINGS: &str = "embeddings";

/// Column family name for per-entry insertion timestamps
pub const CF_TIMESTAMPS: &str = "timestamps";

/// Column family name for the timestamp index
pub const CF_BY_TIME: &str = "by_time";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[CF_EMBEDDINGS, CF_TIMESTAMPS, CF_BY_TIME];

/// Vectors are read far more often than written; compress them.
fn embeddings_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
    opts
}

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(CF_EMBEDDINGS, embeddings_options()),
        ColumnFamilyDescriptor::new(CF_TIMESTAMPS, Options::default()),
        ColumnFamilyDescriptor::new(CF_BY_TIME, Options::default()),
    ]
}
