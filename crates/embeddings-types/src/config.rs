//! Configuration loading for the embeddings service.
//!
//! Layered config: defaults -> config file -> explicit file -> env vars.
//! Config file at ~/.config/embeddings/config.toml (platform equivalent).

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::EmbeddingError;

/// Which feature backend the service should try to use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Deterministic feature hashing (always available)
    #[default]
    Hashing,
    /// External numeric model (optional, best-effort)
    #[serde(alias = "onnx", alias = "candle")]
    NumericModel,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Hashing => "hashing",
            BackendKind::NumericModel => "numeric_model",
        }
    }
}

/// Numeric model backend settings.
///
/// The backend stays disabled unless `enabled` is true AND `model_path`
/// points at an existing model directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericModelSettings {
    /// MUST be explicitly set to true to enable (default: false)
    #[serde(default)]
    pub enabled: bool,

    /// Execution provider preferences, most preferred first ("cpu", "cuda", "mps", ...)
    #[serde(default = "default_providers")]
    pub providers: Vec<String>,

    /// Directory holding config.json, tokenizer.json and model.safetensors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<String>,

    /// Intra-op thread hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intra_op_threads: Option<usize>,

    /// Inter-op thread hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inter_op_threads: Option<usize>,
}

fn default_providers() -> Vec<String> {
    vec!["cpu".to_string()]
}

impl Default for NumericModelSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            providers: default_providers(),
            model_path: None,
            intra_op_threads: None,
            inter_op_threads: None,
        }
    }
}

/// Embeddings service configuration snapshot.
///
/// Built once, normalized with [`ServiceConfig::normalized`], and never
/// mutated by the service afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Whether the surrounding application should use embeddings at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Device hint (informational; computation is CPU-bound)
    #[serde(default = "default_device")]
    pub device: String,

    /// Backend selector
    #[serde(default)]
    pub backend: BackendKind,

    /// Target dimensionality
    #[serde(default = "default_dim")]
    pub dim: usize,

    /// Maximum texts per backend call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// In-memory LRU capacity
    #[serde(default = "default_memory_cache_size")]
    pub memory_cache_size: usize,

    /// Directory holding the on-disk cache
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    /// Disk entry time-to-live in days (negative = never expire)
    #[serde(default = "default_ttl_days")]
    pub ttl_days: i64,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Numeric model backend settings
    #[serde(default)]
    pub numeric_model: NumericModelSettings,
}

fn default_enabled() -> bool {
    true
}

fn default_device() -> String {
    "cpu".to_string()
}

fn default_dim() -> usize {
    384
}

fn default_batch_size() -> usize {
    32
}

fn default_memory_cache_size() -> usize {
    2048
}

fn default_cache_dir() -> String {
    ProjectDirs::from("", "", "embeddings")
        .map(|p| p.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./.cache/embeddings"))
        .to_string_lossy()
        .to_string()
}

fn default_ttl_days() -> i64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            device: default_device(),
            backend: BackendKind::default(),
            dim: default_dim(),
            batch_size: default_batch_size(),
            memory_cache_size: default_memory_cache_size(),
            cache_dir: default_cache_dir(),
            ttl_days: default_ttl_days(),
            log_level: default_log_level(),
            numeric_model: NumericModelSettings::default(),
        }
    }
}

impl ServiceConfig {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/embeddings/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (EMBEDDINGS_*, `__` for nested keys)
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, EmbeddingError> {
        let config_dir = ProjectDirs::from("", "", "embeddings")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("dim", default_dim() as i64)
            .map_err(|e| EmbeddingError::Config(e.to_string()))?
            .set_default("batch_size", default_batch_size() as i64)
            .map_err(|e| EmbeddingError::Config(e.to_string()))?
            .set_default("memory_cache_size", default_memory_cache_size() as i64)
            .map_err(|e| EmbeddingError::Config(e.to_string()))?
            .set_default("cache_dir", default_cache_dir())
            .map_err(|e| EmbeddingError::Config(e.to_string()))?
            .set_default("ttl_days", default_ttl_days())
            .map_err(|e| EmbeddingError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| EmbeddingError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // EMBEDDINGS_DIM, EMBEDDINGS_NUMERIC_MODEL__MODEL_PATH, ...
        builder = builder.add_source(
            Environment::with_prefix("EMBEDDINGS")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("numeric_model.providers")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| EmbeddingError::Config(e.to_string()))?;

        config
            .try_deserialize::<ServiceConfig>()
            .map(ServiceConfig::normalized)
            .map_err(|e| EmbeddingError::Config(e.to_string()))
    }

    /// Clamp sizes to at least 1.
    pub fn normalized(mut self) -> Self {
        self.dim = self.dim.max(1);
        self.batch_size = self.batch_size.max(1);
        self.memory_cache_size = self.memory_cache_size.max(1);
        self
    }

    /// Disk TTL in seconds, `None` when entries never expire.
    pub fn ttl_secs(&self) -> Option<i64> {
        ttl_days_to_secs(self.ttl_days)
    }

    /// Expand ~ in cache_dir to the home directory
    pub fn expanded_cache_dir(&self) -> PathBuf {
        if let Some(rest) = self.cache_dir.strip_prefix("~/") {
            if let Some(home) = std::env::var_os("HOME") {
                return PathBuf::from(home).join(rest);
            }
        }
        PathBuf::from(&self.cache_dir)
    }
}

/// Convert a day count to seconds; negative means infinite.
pub fn ttl_days_to_secs(ttl_days: i64) -> Option<i64> {
    if ttl_days < 0 {
        None
    } else {
        Some(ttl_days.saturating_mul(24 * 60 * 60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert!(config.enabled);
        assert_eq!(config.backend, BackendKind::Hashing);
        assert_eq!(config.dim, 384);
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.ttl_days, 30);
        assert!(!config.numeric_model.enabled);
        assert_eq!(config.numeric_model.providers, vec!["cpu".to_string()]);
    }

    #[test]
    fn test_normalized_clamps_to_one() {
        let config = ServiceConfig {
            dim: 0,
            batch_size: 0,
            memory_cache_size: 0,
            ..Default::default()
        }
        .normalized();
        assert_eq!(config.dim, 1);
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.memory_cache_size, 1);
    }

    #[test]
    fn test_ttl_secs() {
        assert_eq!(ttl_days_to_secs(0), Some(0));
        assert_eq!(ttl_days_to_secs(2), Some(172_800));
        assert_eq!(ttl_days_to_secs(-1), None);
    }

    #[test]
    fn test_backend_aliases() {
        let kind: BackendKind = serde_json::from_str("\"onnx\"").unwrap();
        assert_eq!(kind, BackendKind::NumericModel);
        let kind: BackendKind = serde_json::from_str("\"hashing\"").unwrap();
        assert_eq!(kind, BackendKind::Hashing);
        assert_eq!(BackendKind::NumericModel.as_str(), "numeric_model");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("embeddings.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
dim = 128
batch_size = 4
ttl_days = -1
backend = "numeric_model"

[numeric_model]
enabled = true
providers = ["cuda", "cpu"]
model_path = "/nonexistent/model"
"#
        )
        .unwrap();

        let config = ServiceConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.dim, 128);
        assert_eq!(config.batch_size, 4);
        assert_eq!(config.ttl_secs(), None);
        assert_eq!(config.backend, BackendKind::NumericModel);
        assert!(config.numeric_model.enabled);
        assert_eq!(config.numeric_model.providers, vec!["cuda", "cpu"]);
        assert_eq!(
            config.numeric_model.model_path.as_deref(),
            Some("/nonexistent/model")
        );
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let result = ServiceConfig::load(Some("/definitely/not/here/embeddings.toml"));
        assert!(matches!(result, Err(EmbeddingError::Config(_))));
    }

    #[test]
    fn test_config_serializes_to_toml() {
        let text = toml::to_string(&ServiceConfig::default()).unwrap();
        assert!(text.contains("backend = \"hashing\""));
        assert!(text.contains("[numeric_model]"));
    }
}
