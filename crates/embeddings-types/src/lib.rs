//! # embeddings-types
//!
//! Shared types for the embeddings service.
//!
//! - [`Embedding`]: fixed-length `f32` vector, L2-normalized on construction
//! - [`ServiceConfig`]: layered configuration snapshot (defaults, file, env)
//! - [`EmbeddingError`]: errors that cross the service boundary
//!
//! ## Usage
//!
//! ```rust
//! use embeddings_types::{Embedding, ServiceConfig};
//!
//! let config = ServiceConfig::default().normalized();
//! let zero = Embedding::zeros(config.dim);
//! assert_eq!(zero.dimension(), config.dim);
//! ```

pub mod config;
pub mod error;
pub mod vector;

pub use config::{BackendKind, NumericModelSettings, ServiceConfig};
pub use error::EmbeddingError;
pub use vector::Embedding;
