//! Model error types.

use embeddings_types::EmbeddingError;
use thiserror::Error;

/// Errors raised while loading or running a feature backend.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Candle model error
    #[cfg(feature = "candle")]
    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),

    /// Tokenizer error
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Model file not found
    #[error("Model file not found: {0}")]
    ModelNotFound(String),

    /// Inference runtime not compiled in
    #[error("Inference runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    /// Runtime failed while embedding
    #[error("Inference failed: {0}")]
    Inference(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ModelError> for EmbeddingError {
    fn from(err: ModelError) -> Self {
        EmbeddingError::Model(err.to_string())
    }
}
