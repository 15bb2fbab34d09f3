//! Embeddings service orchestration.
//!
//! Owns one [`CombinedCache`] and one [`FeatureBackend`] for its lifetime.
//! Output always has the input's length and order, and every vector has
//! `config.dim` values. Only input-shape and storage errors are returned;
//! backend trouble degrades to hashing and shows up in logs.

use serde_json::Value;
use std::time::Instant;
use tracing::{debug, field, info, info_span, warn, Span};

use embeddings_models::{EmbeddingModel, FeatureBackend};
use embeddings_storage::{CacheKey, CombinedCache, DiskCache, MemoryCache};
use embeddings_types::{BackendKind, Embedding, EmbeddingError, ServiceConfig};

use crate::metrics::EmbeddingMetrics;

/// Cached, batched text-to-vector service.
pub struct EmbeddingsService {
    config: ServiceConfig,
    cache: CombinedCache,
    backend: FeatureBackend,
    metrics: EmbeddingMetrics,
    span: Span,
}

impl EmbeddingsService {
    /// Build a service from `config`, logging under the current span.
    ///
    /// Fails only if the disk cache cannot be opened. An unusable numeric
    /// model leaves the service on the hashing backend.
    pub fn new(config: ServiceConfig) -> Result<Self, EmbeddingError> {
        Self::with_span(config, Span::current())
    }

    /// Build a service whose logs nest under `parent`.
    pub fn with_span(config: ServiceConfig, parent: Span) -> Result<Self, EmbeddingError> {
        Self::build(config, parent, |config| FeatureBackend::from_config(config))
    }

    /// Build a service around an already-loaded numeric model.
    ///
    /// Skips the configuration gates; `config.backend` is ignored.
    pub fn with_model(
        config: ServiceConfig,
        model: Box<dyn EmbeddingModel>,
    ) -> Result<Self, EmbeddingError> {
        Self::build(config, Span::current(), move |config| {
            FeatureBackend::numeric(model, config.dim)
        })
    }

    fn build(
        config: ServiceConfig,
        parent: Span,
        select_backend: impl FnOnce(&ServiceConfig) -> FeatureBackend,
    ) -> Result<Self, EmbeddingError> {
        let config = config.normalized();
        let span = info_span!(
            parent: &parent,
            "embeddings_service",
            backend = field::Empty,
            dim = config.dim
        );

        let backend = span.in_scope(|| select_backend(&config));
        span.record("backend", backend.id());

        let disk = span.in_scope(|| {
            DiskCache::open(config.expanded_cache_dir(), config.ttl_days)
        })?;
        let cache = CombinedCache::new(MemoryCache::new(config.memory_cache_size), disk);

        span.in_scope(|| {
            info!(
                batch_size = config.batch_size,
                memory_cache_size = config.memory_cache_size,
                ttl_days = config.ttl_days,
                "Embeddings service ready"
            )
        });

        Ok(Self {
            config,
            cache,
            backend,
            metrics: EmbeddingMetrics::default(),
            span,
        })
    }

    /// Embed `texts`, returning one vector per input in input order.
    pub fn embed_texts<S: AsRef<str>>(
        &mut self,
        texts: &[S],
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        let span = self.span.clone();
        let _enter = span.enter();

        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let dim = self.config.dim;
        let backend_id = self.backend.id().to_string();
        let mut results: Vec<Option<Embedding>> = vec![None; texts.len()];
        let mut misses: Vec<(usize, CacheKey, &str)> = Vec::new();

        // 1. Cache lookups, remembering where each miss belongs
        for (index, text) in texts.iter().enumerate() {
            let text = text.as_ref();
            let key = CacheKey::derive(&backend_id, dim, text);
            let cached = match self.cache.get(&key) {
                Ok(cached) => cached,
                Err(e) => {
                    self.cache.reset_counters();
                    return Err(e.into());
                }
            };
            match cached {
                Some(embedding) => results[index] = Some(embedding),
                None => misses.push((index, key, text)),
            }
        }

        // 2. Per-call counts into the cumulative metrics
        let (hits, miss_count) = self.cache.take_counts();
        self.metrics.record_lookups(hits, miss_count);
        debug!(total = texts.len(), hits, misses = miss_count, "Cache lookup complete");

        // 3. Compute misses in batches and write them through
        for batch in misses.chunks(self.config.batch_size) {
            let batch_texts: Vec<&str> = batch.iter().map(|(_, _, text)| *text).collect();

            let started = Instant::now();
            let embeddings = self.backend.embed_batch(&batch_texts);
            let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
            self.metrics.record_batch(latency_ms);
            debug!(size = batch.len(), latency_ms, "Embedded batch");

            for ((index, key, _), embedding) in batch.iter().zip(embeddings) {
                self.cache.put(key.clone(), embedding.clone())?;
                results[*index] = Some(embedding);
            }
        }

        // 4. Zero vector for any slot left empty
        let mut unfilled = 0usize;
        let output: Vec<Embedding> = results
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    unfilled += 1;
                    Embedding::zeros(dim)
                })
            })
            .collect();
        if unfilled > 0 {
            warn!(unfilled, "Backend left results unfilled, substituted zero vectors");
        }

        Ok(output)
    }

    /// Embed texts where missing entries count as empty strings.
    pub fn embed_optional_texts<S: AsRef<str>>(
        &mut self,
        texts: &[Option<S>],
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        let texts: Vec<&str> = texts
            .iter()
            .map(|text| text.as_ref().map(|t| t.as_ref()).unwrap_or(""))
            .collect();
        self.embed_texts(&texts)
    }

    /// Embed a dynamically typed input.
    ///
    /// `null` is an empty list. Array elements are coerced: `null` becomes
    /// "", strings are used as is, anything else is embedded as its JSON
    /// text. Any non-array input is an [`EmbeddingError::InvalidInput`].
    pub fn embed_values(&mut self, input: &Value) -> Result<Vec<Embedding>, EmbeddingError> {
        let texts = coerce_texts(input)?;
        self.embed_texts(&texts)
    }

    /// Embed a single text.
    pub fn embed_one(&mut self, text: &str) -> Result<Embedding, EmbeddingError> {
        Ok(self
            .embed_texts(&[text])?
            .pop()
            .unwrap_or_else(|| Embedding::zeros(self.config.dim)))
    }

    /// Identifier of the recorded backend ("hashing" or "numeric:<name>")
    pub fn backend(&self) -> &str {
        self.backend.id()
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Snapshot of cumulative metrics
    pub fn metrics(&self) -> EmbeddingMetrics {
        self.metrics.clone()
    }

    /// Number of vectors currently persisted in the disk tier
    pub fn disk_entries(&self) -> Result<usize, EmbeddingError> {
        Ok(self.cache.disk().len()?)
    }

    /// Number of vectors currently held in the memory tier
    pub fn memory_entries(&self) -> usize {
        self.cache.memory().len()
    }

    /// Sweep expired entries from the disk tier.
    pub fn purge_expired(&self) -> Result<usize, EmbeddingError> {
        let _enter = self.span.enter();
        Ok(self.cache.disk().purge_expired()?)
    }
}

/// Turn a JSON input into a list of texts.
pub fn coerce_texts(input: &Value) -> Result<Vec<String>, EmbeddingError> {
    match input {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect()),
        other => Err(EmbeddingError::InvalidInput(format!(
            "expected a list of texts, got {}",
            json_type_name(other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
