//! Backend selection and per-batch fallback.
//!
//! A service starts on [`FeatureBackend::Hashing`] and upgrades once, at
//! construction, to [`FeatureBackend::NumericModel`] when every gate passes:
//!
//! 1. `backend = "numeric_model"` is selected
//! 2. `numeric_model.enabled = true`
//! 3. `numeric_model.model_path` is set and exists on disk
//! 4. the inference runtime is compiled in and the model loads
//!
//! A failed gate logs a warning and keeps hashing. After an upgrade the
//! backend identifier stays `numeric:<name>` even when single batches fall
//! back to hashing at inference time.

use std::path::Path;
use tracing::{debug, info, warn};

use embeddings_types::{BackendKind, Embedding, NumericModelSettings, ServiceConfig};

use crate::error::ModelError;
use crate::hashing::{HashingEmbedder, HASHING_BACKEND_ID};
use crate::model::EmbeddingModel;

/// The active vector-computation strategy.
pub enum FeatureBackend {
    /// Deterministic feature hashing
    Hashing(HashingEmbedder),
    /// External numeric model with hashing as the per-batch fallback
    NumericModel {
        /// Identifier used in cache keys (`numeric:<model name>`)
        id: String,
        model: Box<dyn EmbeddingModel>,
        fallback: HashingEmbedder,
    },
}

impl FeatureBackend {
    /// Hashing backend producing `dim`-length vectors.
    pub fn hashing(dim: usize) -> Self {
        FeatureBackend::Hashing(HashingEmbedder::new(dim))
    }

    /// Wrap an already-loaded model. Outputs are fitted to `dim`.
    pub fn numeric(model: Box<dyn EmbeddingModel>, dim: usize) -> Self {
        let id = format!("numeric:{}", model.info().name);
        FeatureBackend::NumericModel {
            id,
            model,
            fallback: HashingEmbedder::new(dim),
        }
    }

    /// Pick the backend for `config`, never failing.
    pub fn from_config(config: &ServiceConfig) -> Self {
        if config.backend != BackendKind::NumericModel {
            debug!("Using hashing backend");
            return Self::hashing(config.dim);
        }

        let settings = &config.numeric_model;
        if !settings.enabled {
            warn!("Numeric model backend selected but not enabled, using hashing");
            return Self::hashing(config.dim);
        }

        let Some(model_path) = settings.model_path.as_deref().filter(|p| !p.trim().is_empty())
        else {
            warn!("Numeric model backend has no model_path, using hashing");
            return Self::hashing(config.dim);
        };

        if !Path::new(model_path).exists() {
            warn!(path = %model_path, "Numeric model path does not exist, using hashing");
            return Self::hashing(config.dim);
        }

        match load_numeric_model(settings) {
            Ok(model) => {
                let backend = Self::numeric(model, config.dim);
                info!(backend = %backend.id(), "Numeric model backend active");
                backend
            }
            Err(e) => {
                warn!(error = %e, "Numeric model unavailable, using hashing");
                Self::hashing(config.dim)
            }
        }
    }

    /// Identifier folded into cache keys
    pub fn id(&self) -> &str {
        match self {
            FeatureBackend::Hashing(_) => HASHING_BACKEND_ID,
            FeatureBackend::NumericModel { id, .. } => id,
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            FeatureBackend::Hashing(_) => BackendKind::Hashing,
            FeatureBackend::NumericModel { .. } => BackendKind::NumericModel,
        }
    }

    /// Output dimensionality
    pub fn dimension(&self) -> usize {
        match self {
            FeatureBackend::Hashing(hashing) => hashing.dimension(),
            FeatureBackend::NumericModel { fallback, .. } => fallback.dimension(),
        }
    }

    /// Embed a batch. Always returns one `dimension()`-length vector per text.
    ///
    /// Numeric model errors, a result of the wrong length, or any NaN or
    /// infinite component fall back to hashing for the whole batch.
    pub fn embed_batch(&self, texts: &[&str]) -> Vec<Embedding> {
        match self {
            FeatureBackend::Hashing(hashing) => hashing.embed_all(texts),
            FeatureBackend::NumericModel {
                id,
                model,
                fallback,
            } => match model.embed_batch(texts) {
                Ok(embeddings) if embeddings.len() == texts.len() => {
                    let dim = fallback.dimension();
                    let fitted: Vec<Embedding> =
                        embeddings.into_iter().map(|e| e.fit_to(dim)).collect();
                    if fitted.iter().all(is_finite) {
                        return fitted;
                    }
                    warn!(
                        backend = %id,
                        count = texts.len(),
                        "Numeric model returned non-finite values, using hashing for this batch"
                    );
                    fallback.embed_all(texts)
                }
                Ok(embeddings) => {
                    warn!(
                        backend = %id,
                        expected = texts.len(),
                        actual = embeddings.len(),
                        "Numeric model returned wrong batch size, using hashing for this batch"
                    );
                    fallback.embed_all(texts)
                }
                Err(e) => {
                    warn!(
                        backend = %id,
                        error = %e,
                        count = texts.len(),
                        "Numeric model failed, using hashing for this batch"
                    );
                    fallback.embed_all(texts)
                }
            },
        }
    }
}

/// NaN or infinite components cannot be cached or compared.
fn is_finite(embedding: &Embedding) -> bool {
    embedding.values.iter().all(|v| v.is_finite())
}

/// Load the numeric model named by `settings` with the compiled-in runtime.
#[cfg(feature = "candle")]
pub fn load_numeric_model(
    settings: &NumericModelSettings,
) -> Result<Box<dyn EmbeddingModel>, ModelError> {
    let dir = settings
        .model_path
        .as_deref()
        .ok_or_else(|| ModelError::ModelNotFound("model_path not set".to_string()))?;
    let paths = crate::paths::ModelPaths::from_dir(dir)?;
    let model = crate::candle::CandleEmbedder::load(&paths, settings)?;
    Ok(Box::new(model))
}

/// Load the numeric model named by `settings` with the compiled-in runtime.
#[cfg(not(feature = "candle"))]
pub fn load_numeric_model(
    _settings: &NumericModelSettings,
) -> Result<Box<dyn EmbeddingModel>, ModelError> {
    Err(ModelError::RuntimeUnavailable(
        "built without the `candle` feature".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelInfo;

    struct FixedModel {
        info: ModelInfo,
        fail: bool,
        output: Option<Vec<f32>>,
    }

    impl FixedModel {
        fn new(dimension: usize, fail: bool) -> Self {
            Self {
                info: ModelInfo {
                    name: "fixed".to_string(),
                    dimension,
                    max_sequence_length: 16,
                },
                fail,
                output: None,
            }
        }

        /// Model that returns `values` verbatim for every text.
        fn emitting(values: Vec<f32>) -> Self {
            let mut model = Self::new(values.len(), false);
            model.output = Some(values);
            model
        }
    }

    impl EmbeddingModel for FixedModel {
        fn info(&self) -> &ModelInfo {
            &self.info
        }

        fn embed(&self, _text: &str) -> Result<Embedding, ModelError> {
            if self.fail {
                return Err(ModelError::Inference("boom".to_string()));
            }
            match &self.output {
                Some(values) => Ok(Embedding {
                    values: values.clone(),
                }),
                None => Ok(Embedding::new(vec![1.0; self.info.dimension])),
            }
        }
    }

    fn numeric_config(model_path: Option<String>) -> ServiceConfig {
        let mut config = ServiceConfig {
            backend: BackendKind::NumericModel,
            dim: 16,
            ..Default::default()
        };
        config.numeric_model.enabled = true;
        config.numeric_model.model_path = model_path;
        config
    }

    #[test]
    fn test_default_config_is_hashing() {
        let backend = FeatureBackend::from_config(&ServiceConfig::default());
        assert_eq!(backend.id(), HASHING_BACKEND_ID);
        assert_eq!(backend.kind(), BackendKind::Hashing);
    }

    #[test]
    fn test_missing_model_path_falls_back() {
        let backend = FeatureBackend::from_config(&numeric_config(None));
        assert_eq!(backend.id(), HASHING_BACKEND_ID);
    }

    #[test]
    fn test_nonexistent_model_path_falls_back() {
        let config = numeric_config(Some("/nonexistent/models/minilm".to_string()));
        let backend = FeatureBackend::from_config(&config);
        assert_eq!(backend.id(), HASHING_BACKEND_ID);
        assert_eq!(backend.dimension(), 16);
    }

    #[test]
    fn test_disabled_numeric_falls_back() {
        let mut config = numeric_config(Some("/tmp".to_string()));
        config.numeric_model.enabled = false;
        assert_eq!(FeatureBackend::from_config(&config).id(), HASHING_BACKEND_ID);
    }

    #[test]
    fn test_incomplete_model_dir_falls_back() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = numeric_config(Some(temp.path().to_string_lossy().to_string()));
        assert_eq!(FeatureBackend::from_config(&config).id(), HASHING_BACKEND_ID);
    }

    #[test]
    fn test_numeric_output_truncated_to_dim() {
        let backend = FeatureBackend::numeric(Box::new(FixedModel::new(32, false)), 8);
        assert_eq!(backend.id(), "numeric:fixed");
        let out = backend.embed_batch(&["a", "b"]);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|e| e.dimension() == 8));
    }

    #[test]
    fn test_numeric_output_padded_to_dim() {
        let backend = FeatureBackend::numeric(Box::new(FixedModel::new(4, false)), 8);
        let out = backend.embed_batch(&["a"]);
        assert_eq!(out[0].dimension(), 8);
        assert!(out[0].values[4..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_numeric_failure_uses_hashing_for_batch() {
        let backend = FeatureBackend::numeric(Box::new(FixedModel::new(8, true)), 8);
        let out = backend.embed_batch(&["jazz night", "farmers market"]);
        let expected = HashingEmbedder::new(8).embed_all(&["jazz night", "farmers market"]);
        assert_eq!(out, expected);
        // The label does not change after a fallback
        assert_eq!(backend.kind(), BackendKind::NumericModel);
    }

    #[test]
    fn test_nan_output_uses_hashing_for_batch() {
        let model = FixedModel::emitting(vec![f32::NAN, 1.0, 0.0, 0.0]);
        let backend = FeatureBackend::numeric(Box::new(model), 4);

        let out = backend.embed_batch(&["hello", "world"]);
        assert_eq!(out, HashingEmbedder::new(4).embed_all(&["hello", "world"]));
        assert!(out.iter().all(is_finite));
        assert_eq!(backend.id(), "numeric:fixed");
    }

    #[test]
    fn test_infinite_output_uses_hashing_for_batch() {
        let model = FixedModel::emitting(vec![f32::INFINITY, 0.0, 0.0, 0.0]);
        let backend = FeatureBackend::numeric(Box::new(model), 4);
        let out = backend.embed_batch(&["hello"]);
        assert_eq!(out, HashingEmbedder::new(4).embed_all(&["hello"]));
    }

    #[test]
    fn test_non_finite_component_truncated_away_is_kept() {
        // The NaN sits past the target dimension, so the fitted vector is clean
        let model = FixedModel::emitting(vec![0.0, 1.0, f32::NAN]);
        let backend = FeatureBackend::numeric(Box::new(model), 2);
        let out = backend.embed_batch(&["hello"]);
        assert_eq!(out[0].values, vec![0.0, 1.0]);
    }
}
