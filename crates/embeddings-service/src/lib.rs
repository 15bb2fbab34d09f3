//! # embeddings-service
//!
//! Text-to-vector service with a two-tier cache and a pluggable feature
//! backend.
//!
//! ```text
//! embed_texts(texts)
//!   │
//!   ├─ derive CacheKey(backend, dim, text) per input
//!   ├─ CombinedCache lookup (memory LRU, then RocksDB)
//!   ├─ misses chunked into batches of `batch_size`
//!   │     └─ FeatureBackend::embed_batch (numeric model or hashing)
//!   ├─ write-through to both cache tiers
//!   └─ results assembled in input order
//! ```
//!
//! The service is synchronous and single-threaded: it takes `&mut self`
//! and does not lock its cache or counters.

pub mod metrics;
pub mod service;

pub use metrics::EmbeddingMetrics;
pub use service::EmbeddingsService;

pub use embeddings_models::{EmbeddingModel, FeatureBackend, ModelError, ModelInfo};
pub use embeddings_types::{BackendKind, Embedding, EmbeddingError, ServiceConfig};
