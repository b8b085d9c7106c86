//! Error handling module for StreamTrim

use thiserror::Error;

/// Main error type for trim operations
///
/// Every variant is terminal for the current invocation. Nothing is retried.
#[derive(Error, Debug)]
pub enum TrimError {
    /// Time string is not `mm:ss`
    #[error("Invalid time format: {time:?}. Expected mm:ss")]
    MalformedTimeFormat { time: String },

    /// Window start is not before window end
    #[error("Invalid window: start ({start}s) must be before end ({end}s)")]
    InvalidWindow { start: u32, end: u32 },

    /// Source container could not be opened or probed
    #[error("Could not open input {path}: {message}")]
    SourceOpen { path: String, message: String },

    /// No muxer matches the destination path
    #[error("No output container format matches {path}")]
    OutputFormatUnresolvable { path: String },

    /// Destination could not be opened, set up or finalized
    #[error("Failed to write output {path}: {message}")]
    OutputWrite { path: String, message: String },

    /// Backward seek to the window start was rejected
    #[error("Seek to {target} failed: {message}")]
    SeekFailure { target: i64, message: String },

    /// A packet could not be written; the trailer was still written
    #[error("Error writing packet {packet} of stream {stream}: {message}")]
    PacketWrite {
        stream: usize,
        packet: u64,
        message: String,
    },

    /// Settings could not be assembled
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// FFmpeg initialization error
    #[error("Failed to initialize FFmpeg: {message}")]
    FFmpegInit { message: String },
}

impl TrimError {
    /// Shorthand for configuration failures
    pub fn config(message: impl Into<String>) -> Self {
        TrimError::Config {
            message: message.into(),
        }
    }

    /// True when output bytes may exist on disk for this failure
    pub fn touched_output(&self) -> bool {
        matches!(
            self,
            TrimError::OutputWrite { .. } | TrimError::PacketWrite { .. }
        )
    }
}

/// Result type alias for trim operations
pub type TrimResult<T> = std::result::Result<T, TrimError>;
