//! Embedding model trait and types.
//!
//! Defines the interface for generating vector embeddings from text.

use embeddings_types::Embedding;

use crate::error::ModelError;

/// Model information
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Model name (e.g., "all-MiniLM-L6-v2")
    pub name: String,
    /// Native embedding dimension
    pub dimension: usize,
    /// Maximum sequence length in tokens (0 when not token-based)
    pub max_sequence_length: usize,
}

/// Trait for embedding models.
///
/// Implementations must be thread-safe (Send + Sync). Outputs may have any
/// length; callers fit them to the configured dimensionality.
pub trait EmbeddingModel: Send + Sync {
    /// Get model information
    fn info(&self) -> &ModelInfo;

    /// Generate embedding for a single text.
    fn embed(&self, text: &str) -> Result<Embedding, ModelError>;

    /// Generate embeddings for multiple texts (batch).
    /// Default implementation calls embed() for each text.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, ModelError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}
