//! Embeddings CLI library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (embed, stats, purge, config)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::{
    embed_command, init_logging, load_settings, purge_command, show_config, show_stats,
    Overrides,
};
