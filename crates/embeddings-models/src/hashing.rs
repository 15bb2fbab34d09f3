//! Feature-hashing embedder.
//!
//! Lowercases the text, splits on non-alphanumeric characters, and projects
//! every unigram and adjacent bigram into `dim` buckets. Each feature hashes
//! with SHA-256 (first 8 bytes, little-endian): the low bits pick the bucket
//! and bit 63 picks the sign. The signed counts are then L2-normalized.
//!
//! The output depends only on the text and `dim`, so it is bit-identical
//! across calls and restarts.

use sha2::{Digest, Sha256};
use tracing::trace;

use embeddings_types::Embedding;

use crate::error::ModelError;
use crate::model::{EmbeddingModel, ModelInfo};

/// Backend identifier used in cache keys
pub const HASHING_BACKEND_ID: &str = "hashing";

/// Stateless feature-hashing embedder.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    info: ModelInfo,
}

impl HashingEmbedder {
    /// Create an embedder producing `dim`-length vectors (clamped to 1).
    pub fn new(dim: usize) -> Self {
        Self {
            info: ModelInfo {
                name: HASHING_BACKEND_ID.to_string(),
                dimension: dim.max(1),
                max_sequence_length: 0,
            },
        }
    }

    pub fn dimension(&self) -> usize {
        self.info.dimension
    }

    /// Embed one text. Text without tokens yields the all-zero vector.
    pub fn embed_text(&self, text: &str) -> Embedding {
        let dim = self.info.dimension;
        let mut values = vec![0.0f32; dim];

        let tokens = tokenize(text);
        let bigrams = tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1]));

        for feature in tokens.iter().cloned().chain(bigrams) {
            let hash = feature_hash(&feature);
            let bucket = (hash % dim as u64) as usize;
            let sign = if hash >> 63 == 1 { -1.0 } else { 1.0 };
            values[bucket] += sign;
        }

        trace!(tokens = tokens.len(), dim, "Hashed text");
        Embedding::new(values)
    }

    /// Embed a batch; empty in, empty out.
    pub fn embed_all(&self, texts: &[&str]) -> Vec<Embedding> {
        texts.iter().map(|text| self.embed_text(text)).collect()
    }
}

impl EmbeddingModel for HashingEmbedder {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn embed(&self, text: &str) -> Result<Embedding, ModelError> {
        Ok(self.embed_text(text))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, ModelError> {
        Ok(self.embed_all(texts))
    }
}

/// Case-folded word tokens.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn feature_hash(feature: &str) -> u64 {
    let digest = Sha256::digest(feature.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
