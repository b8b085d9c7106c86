//! StreamTrim CLI
//!
//! Lossless trimming of audio/video containers by stream copy.
//!
//! # Usage
//!
//! ```bash
//! streamtrim trim --input talk.mp4 --output clip.mp4 --start 00:10 --end 00:20
//! streamtrim probe --input talk.mp4 --json
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::info;

use streamtrim::cli::{commands, Cli, Commands};
use streamtrim::config::{FileConfig, Settings};
use streamtrim::utils::logging::init_logging;

/// Main entry point for the StreamTrim CLI application
fn main() -> Result<()> {
    let cli = Cli::parse();

    let file = FileConfig::load(cli.config.as_deref())?;
    let settings = Settings::resolve(file, cli.overrides());

    init_logging(&settings.logging)?;

    match &cli.command {
        Commands::Trim(args) => {
            info!("Executing trim command");
            commands::trim(&settings, args)?;
        }
        Commands::Probe(args) => {
            info!("Executing probe command");
            commands::probe(&settings, args)?;
        }
    }

    Ok(())
}
