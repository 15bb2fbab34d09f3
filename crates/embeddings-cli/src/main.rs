//! Embeddings CLI binary.
//!
//! Usage:
//!   embeddings embed "first text" "second text"
//!   echo '["a", null, "b"]' | embeddings embed
//!   embeddings stats
//!   embeddings purge
//!   embeddings config

use anyhow::{Context, Result};
use clap::Parser;

use embeddings_cli::{
    embed_command, init_logging, load_settings, purge_command, show_config, show_stats, Cli,
    Commands, Overrides,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut overrides = Overrides {
        log_level: cli.log_level.clone(),
        cache_dir: cli.cache_dir.clone(),
        ..Default::default()
    };
    if let Commands::Embed {
        dim, batch_size, ..
    } = &cli.command
    {
        overrides.dim = *dim;
        overrides.batch_size = *batch_size;
    }

    let settings = load_settings(cli.config.as_deref(), &overrides)?;
    init_logging(&settings.log_level)?;

    match cli.command {
        Commands::Embed { texts, .. } => {
            let (embeddings, service) = embed_command(settings, texts, std::io::stdin().lock())?;
            let output =
                serde_json::to_string(&embeddings).context("Failed to serialize embeddings")?;
            println!("{}", output);

            let metrics = serde_json::to_string(&service.metrics())
                .context("Failed to serialize metrics")?;
            eprintln!("{}", metrics);
        }
        Commands::Stats => show_stats(settings)?,
        Commands::Purge => {
            purge_command(settings)?;
        }
        Commands::Config => show_config(&settings)?,
    }

    Ok(())
}
