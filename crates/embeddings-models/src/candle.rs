//! Candle-based embedding implementation.
//!
//! Runs a BERT-style sentence encoder (e.g. all-MiniLM-L6-v2) with mean
//! pooling over the attention mask. Every batch goes through the model in
//! a single forward pass.

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use embeddings_types::{Embedding, NumericModelSettings};

use crate::error::ModelError;
use crate::model::{EmbeddingModel, ModelInfo};
use crate::paths::ModelPaths;
use crate::providers::{normalize_providers, COREML_PROVIDER, CPU_PROVIDER, CUDA_PROVIDER};

/// Maximum sequence length
pub const MAX_SEQ_LENGTH: usize = 256;

/// Candle-based sentence embedder.
pub struct CandleEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    info: ModelInfo,
}

impl CandleEmbedder {
    /// Load the model found in `paths` on the first device the provider
    /// preferences allow.
    pub fn load(paths: &ModelPaths, settings: &NumericModelSettings) -> Result<Self, ModelError> {
        info!(path = ?paths.dir, "Loading embedding model...");

        let device = select_device(&settings.providers);
        if settings.intra_op_threads.is_some() || settings.inter_op_threads.is_some() {
            // Candle sizes its own CPU pool; the hints are recorded only
            debug!(
                intra_op = ?settings.intra_op_threads,
                inter_op = ?settings.inter_op_threads,
                "Thread hints are informational for the candle runtime"
            );
        }

        let config_str = std::fs::read_to_string(&paths.config)?;
        let config: BertConfig = serde_json::from_str(&config_str)
            .map_err(|e| ModelError::ModelNotFound(format!("Invalid config: {}", e)))?;
        let dimension = serde_json::from_str::<serde_json::Value>(&config_str)
            .ok()
            .and_then(|v| v.get("hidden_size").and_then(|h| h.as_u64()))
            .map(|h| h as usize)
            .ok_or_else(|| ModelError::ModelNotFound("config.json has no hidden_size".to_string()))?;

        let tokenizer = Tokenizer::from_file(&paths.tokenizer)
            .map_err(|e| ModelError::Tokenizer(e.to_string()))?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[paths.weights.clone()], DType::F32, &device)?
        };

        let model = BertModel::load(vb, &config)?;

        let name = paths.model_name();
        info!(
            model = %name,
            dim = dimension,
            max_seq = MAX_SEQ_LENGTH,
            device = ?device,
            "Model loaded successfully"
        );

        Ok(Self {
            model,
            tokenizer,
            device,
            info: ModelInfo {
                name,
                dimension,
                max_sequence_length: MAX_SEQ_LENGTH,
            },
        })
    }

    /// Mean pooling over token embeddings (excluding padding)
    fn mean_pooling(&self, embeddings: &Tensor, attention_mask: &Tensor) -> Result<Tensor, ModelError> {
        let mask = attention_mask
            .unsqueeze(2)?
            .broadcast_as(embeddings.shape())?;
        let mask_f32 = mask.to_dtype(DType::F32)?;

        let masked = embeddings.broadcast_mul(&mask_f32)?;
        let sum = masked.sum(1)?;

        // Divide by number of real tokens; clamp keeps all-padding rows finite
        let mask_sum = mask_f32.sum(1)?.clamp(1e-9, f64::MAX)?;

        Ok(sum.broadcast_div(&mask_sum)?)
    }
}

impl EmbeddingModel for CandleEmbedder {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn embed(&self, text: &str) -> Result<Embedding, ModelError> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::Inference("model returned no output".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, ModelError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        debug!(count = texts.len(), "Embedding batch");

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| ModelError::Tokenizer(e.to_string()))?;

        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0)
            .clamp(1, MAX_SEQ_LENGTH);
        let (ids, mask) = pad_encodings(&encodings, seq_len);

        let shape = (texts.len(), seq_len);
        let input_ids = Tensor::from_vec(ids, shape, &self.device)?;
        let attention_mask = Tensor::from_vec(mask, shape, &self.device)?;
        let token_type_ids = Tensor::zeros_like(&input_ids)?;

        let output = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        let pooled = self.mean_pooling(&output, &attention_mask)?;
        let pooled_vec: Vec<Vec<f32>> = pooled.to_vec2()?;

        let embeddings: Vec<Embedding> = pooled_vec.into_iter().map(Embedding::new).collect();

        debug!(count = embeddings.len(), dim = self.info.dimension, "Batch complete");
        Ok(embeddings)
    }
}

/// Flatten encodings into row-major id and mask buffers of `seq_len` columns.
fn pad_encodings(encodings: &[tokenizers::Encoding], seq_len: usize) -> (Vec<u32>, Vec<u32>) {
    let mut ids = vec![0u32; encodings.len() * seq_len];
    let mut mask = vec![0u32; encodings.len() * seq_len];
    for (row, encoding) in encodings.iter().enumerate() {
        let start = row * seq_len;
        let take = encoding.get_ids().len().min(seq_len);
        ids[start..start + take].copy_from_slice(&encoding.get_ids()[..take]);
        mask[start..start + take].copy_from_slice(&encoding.get_attention_mask()[..take]);
    }
    (ids, mask)
}

/// First device the provider preferences allow; CPU when none does.
fn select_device(providers: &[String]) -> Device {
    for provider in normalize_providers(providers) {
        match provider.as_str() {
            CPU_PROVIDER => return Device::Cpu,
            CUDA_PROVIDER => match Device::new_cuda(0) {
                Ok(device) => return device,
                Err(e) => debug!(provider = %provider, error = %e, "Provider unavailable"),
            },
            COREML_PROVIDER => match Device::new_metal(0) {
                Ok(device) => return device,
                Err(e) => debug!(provider = %provider, error = %e, "Provider unavailable"),
            },
            other => debug!(provider = other, "Provider not supported by candle, skipping"),
        }
    }
    Device::Cpu
}

#[cfg(test)]
mod tests {
    use super::*;

    // Model tests need a local model directory, run with:
    // EMBEDDINGS_TEST_MODEL_DIR=/path/to/all-MiniLM-L6-v2 cargo test -p embeddings-models -- --ignored

    fn load_test_model() -> CandleEmbedder {
        let dir = std::env::var("EMBEDDINGS_TEST_MODEL_DIR").unwrap();
        let paths = ModelPaths::from_dir(dir).unwrap();
        CandleEmbedder::load(&paths, &NumericModelSettings::default()).unwrap()
    }

    #[test]
    fn test_select_device_falls_back_to_cpu() {
        let providers = vec!["tensorrt".to_string(), "unknown".to_string()];
        assert!(matches!(select_device(&providers), Device::Cpu));
        assert!(matches!(select_device(&[]), Device::Cpu));
    }

    #[test]
    #[ignore = "requires model files"]
    fn test_embed_batch() {
        let embedder = load_test_model();
        let embeddings = embedder.embed_batch(&["Hello", "World", "Test"]).unwrap();
        assert_eq!(embeddings.len(), 3);
        for emb in &embeddings {
            assert_eq!(emb.dimension(), embedder.info().dimension);
        }
    }

    #[test]
    #[ignore = "requires model files"]
    fn test_similar_texts_high_similarity() {
        let embedder = load_test_model();
        let emb1 = embedder.embed("The cat sat on the mat").unwrap();
        let emb2 = embedder.embed("A cat is sitting on a mat").unwrap();
        let emb3 = embedder.embed("Python programming language").unwrap();
        assert!(emb1.cosine_similarity(&emb2) > emb1.cosine_similarity(&emb3));
    }
}
