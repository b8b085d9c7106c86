//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

use crate::domain::model::EndPolicy;

/// Arguments for the trim command
#[derive(Args, Debug)]
pub struct TrimArgs {
    /// Input media file path
    #[arg(short, long, env = "STREAMTRIM_INPUT")]
    pub input: Option<PathBuf>,

    /// Output file path; its extension selects the container
    #[arg(short, long, env = "STREAMTRIM_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Start time (mm:ss)
    #[arg(short, long, env = "STREAMTRIM_START")]
    pub start: Option<String>,

    /// End time (mm:ss), exclusive
    #[arg(short, long, env = "STREAMTRIM_END")]
    pub end: Option<String>,

    /// What to do when a packet crosses the end (stop, drain)
    #[arg(long, env = "STREAMTRIM_END_POLICY")]
    pub end_policy: Option<EndPolicy>,

    /// Run the cut policy without writing an output file
    #[arg(long)]
    pub dry_run: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the probe command
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Input media file path
    #[arg(short, long, env = "STREAMTRIM_INPUT")]
    pub input: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
