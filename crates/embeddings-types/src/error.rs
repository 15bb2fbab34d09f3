//! Error types for the embeddings service.

use thiserror::Error;

/// Errors that can cross the embeddings service boundary.
///
/// Only configuration, input and persistence errors reach callers of
/// `embed_texts`. Model failures are absorbed by the hashing fallback and
/// only show up here when a model is loaded or called directly.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input had the wrong shape (e.g. a JSON object instead of a list)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Persistence layer failure (disk cache unreachable or unwritable)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Numeric model failure
    #[error("Model error: {0}")]
    Model(String),
}
