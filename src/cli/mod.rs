//! CLI module for StreamTrim
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Overrides;
use crate::utils::logging::LogFormat;

pub mod args;
pub mod commands;

/// StreamTrim
///
/// Cuts a time window out of a media file without re-encoding. The cut
/// starts on the video keyframe at or before the requested start.
#[derive(Parser, Debug)]
#[command(name = "streamtrim")]
#[command(about = "Lossless keyframe-snapped trimming of audio/video files")]
#[command(version)]
pub struct Cli {
    /// Logging level (trace, debug, info, warn, error, off)
    #[arg(long, global = true, env = "STREAMTRIM_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum, env = "STREAMTRIM_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// TOML config file (default: ./streamtrim.toml when present)
    #[arg(long, global = true, env = "STREAMTRIM_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cut a window out of a media file
    Trim(args::TrimArgs),
    /// Show the streams a trim would copy
    Probe(args::ProbeArgs),
}

impl Cli {
    /// Flag and environment values for layering over the config file
    pub fn overrides(&self) -> Overrides {
        let mut overrides = Overrides {
            log_level: self.log_level.clone(),
            log_format: self.log_format,
            ..Overrides::default()
        };

        match &self.command {
            Commands::Trim(args) => {
                overrides.input = args.input.clone();
                overrides.output = args.output.clone();
                overrides.start = args.start.clone();
                overrides.end = args.end.clone();
                overrides.end_policy = args.end_policy;
            }
            Commands::Probe(args) => {
                overrides.input = args.input.clone();
            }
        }

        overrides
    }
}
