//! # embeddings-models
//!
//! Feature backends that turn text into fixed-dimensionality vectors.
//!
//! ## Features
//! - [`HashingEmbedder`]: deterministic unigram/bigram feature hashing, always available
//! - [`CandleEmbedder`]: local sentence-encoder inference via Candle (cargo feature `candle`)
//! - [`FeatureBackend`]: closed choice between the two, with per-batch
//!   fallback from the numeric model to hashing
//!
//! Any [`EmbeddingModel`] implementation can be plugged in as the numeric
//! model through [`FeatureBackend::numeric`].

pub mod backend;
#[cfg(feature = "candle")]
pub mod candle;
pub mod error;
pub mod hashing;
pub mod model;
pub mod paths;
pub mod providers;

pub use backend::{load_numeric_model, FeatureBackend};
#[cfg(feature = "candle")]
pub use crate::candle::CandleEmbedder;
pub use error::ModelError;
pub use hashing::{HashingEmbedder, HASHING_BACKEND_ID};
pub use model::{EmbeddingModel, ModelInfo};
pub use paths::{ModelPaths, MODEL_FILES};
pub use providers::{normalize_provider, normalize_providers};
