//! Core trimming engine module

use std::path::PathBuf;

use serde::Serialize;

use crate::domain::model::{EndPolicy, SourceLayout, Window};

pub mod bootstrap;
pub mod copy;
pub mod relay;
pub mod seek;

pub use copy::{trim_streams, StreamCopyTrimmer};
pub use relay::{RelayEngine, RelayReport, Termination};
pub use seek::SeekPlan;

/// One trim invocation
#[derive(Debug, Clone)]
pub struct TrimRequest {
    /// Source container path
    pub input: PathBuf,
    /// Destination path; the extension selects the container format
    pub output: PathBuf,
    /// Start time as `mm:ss`
    pub start: String,
    /// End time as `mm:ss`
    pub end: String,
    pub end_policy: EndPolicy,
}

/// Result of a successful trim or dry run
#[derive(Debug, Clone, Serialize)]
pub struct TrimReport {
    pub input: PathBuf,
    /// `None` for dry runs
    pub output: Option<PathBuf>,
    pub window: Window,
    pub end_policy: EndPolicy,
    pub seek: SeekPlan,
    pub relay: RelayReport,
    pub elapsed_ms: u128,
}

/// Source inspection without writing
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub input: PathBuf,
    pub format: String,
    pub duration_seconds: Option<f64>,
    pub layout: SourceLayout,
}
