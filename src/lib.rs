//! StreamTrim Library
//!
//! Cuts a `[start, end)` window out of an audio/video container by stream
//! copy. The cut snaps back to the primary video keyframe, every copied
//! stream is rebased to start at zero, and the output container is always
//! finalized once its header is written.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use domain::model::{EndPolicy, MediaKind, SourceLayout, TimeBase, Window};
pub use engine::{StreamCopyTrimmer, TrimReport, TrimRequest};
pub use error::{TrimError, TrimResult};
pub use utils::time::{format_time, parse_time};

/// Initialize StreamTrim library
pub fn init() -> TrimResult<()> {
    ffmpeg_next::init().map_err(|e| TrimError::FFmpegInit {
        message: e.to_string(),
    })?;

    Ok(())
}
