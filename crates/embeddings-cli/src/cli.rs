//! CLI argument parsing for the embeddings binary.
//!
//! CLI flags override every other config source.

use clap::{Parser, Subcommand};

/// Text embeddings with a persistent two-tier cache
#[derive(Parser, Debug)]
#[command(name = "embeddings")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/embeddings/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override cache directory
    #[arg(long, global = true)]
    pub cache_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Embed texts and print the vectors as a JSON array
    ///
    /// With no TEXT arguments, reads a JSON array of texts (or null) from stdin.
    Embed {
        /// Texts to embed
        texts: Vec<String>,

        /// Override target dimensionality
        #[arg(long)]
        dim: Option<usize>,

        /// Override batch size
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Show disk cache size and configured backend
    Stats,

    /// Delete expired entries from the disk cache
    Purge,

    /// Print the effective configuration as TOML
    Config,
}
