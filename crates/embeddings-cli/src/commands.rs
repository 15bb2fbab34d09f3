//! Command implementations for the embeddings binary.
//!
//! Vectors go to stdout as JSON; logs and metrics go to stderr.

use anyhow::{bail, Context, Result};
use std::io::Read;
use tracing::info;

use embeddings_service::{Embedding, EmbeddingsService};
use embeddings_types::ServiceConfig;

/// CLI-level overrides applied after config loading.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub log_level: Option<String>,
    pub cache_dir: Option<String>,
    pub dim: Option<usize>,
    pub batch_size: Option<usize>,
}

/// Load configuration and apply CLI overrides (highest precedence).
pub fn load_settings(config_path: Option<&str>, overrides: &Overrides) -> Result<ServiceConfig> {
    let mut settings = ServiceConfig::load(config_path).context("Failed to load configuration")?;

    if let Some(level) = &overrides.log_level {
        settings.log_level = level.clone();
    }
    if let Some(cache_dir) = &overrides.cache_dir {
        settings.cache_dir = cache_dir.clone();
    }
    if let Some(dim) = overrides.dim {
        settings.dim = dim;
    }
    if let Some(batch_size) = overrides.batch_size {
        settings.batch_size = batch_size;
    }

    Ok(settings.normalized())
}

/// Install the global tracing subscriber, writing to stderr.
///
/// RUST_LOG wins over the configured level.
pub fn init_logging(level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Embed `texts`, or the JSON read from `stdin` when `texts` is empty.
pub fn embed_command(
    settings: ServiceConfig,
    texts: Vec<String>,
    stdin: impl Read,
) -> Result<(Vec<Embedding>, EmbeddingsService)> {
    if !settings.enabled {
        bail!("Embeddings are disabled in configuration (enabled = false)");
    }

    let mut service = EmbeddingsService::new(settings).context("Failed to open embeddings service")?;

    let embeddings = if texts.is_empty() {
        let input: serde_json::Value =
            serde_json::from_reader(stdin).context("Failed to parse JSON from stdin")?;
        service.embed_values(&input)?
    } else {
        service.embed_texts(&texts)?
    };

    let metrics = service.metrics();
    info!(
        count = embeddings.len(),
        backend = %service.backend(),
        hits = metrics.cache_hits,
        misses = metrics.cache_misses,
        batches = metrics.batches(),
        "Embedding complete"
    );

    Ok((embeddings, service))
}

/// Print entry count and backend.
pub fn show_stats(settings: ServiceConfig) -> Result<()> {
    let service = EmbeddingsService::new(settings).context("Failed to open embeddings service")?;
    println!("Backend: {}", service.backend());
    println!("Dimension: {}", service.config().dim);
    println!("Cache dir: {}", service.config().expanded_cache_dir().display());
    println!("Disk entries: {}", service.disk_entries()?);
    match service.config().ttl_secs() {
        Some(secs) => println!("TTL: {} days ({}s)", service.config().ttl_days, secs),
        None => println!("TTL: never expires"),
    }
    Ok(())
}

/// Sweep expired entries and report how many were removed.
pub fn purge_command(settings: ServiceConfig) -> Result<usize> {
    let service = EmbeddingsService::new(settings).context("Failed to open embeddings service")?;
    let purged = service.purge_expired()?;
    println!("Purged {} expired entries", purged);
    Ok(purged)
}

/// Print the effective configuration as TOML.
pub fn show_config(settings: &ServiceConfig) -> Result<()> {
    let text = toml::to_string_pretty(settings).context("Failed to render configuration")?;
    print!("{}", text);
    Ok(())
}
