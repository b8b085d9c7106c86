//! Time parsing and formatting utilities
//!
//! Cut points are whole seconds written as `mm:ss`. There is no sub-second
//! precision, so a trim can never be more accurate than one second before
//! keyframe snapping is even taken into account.

use crate::error::{TrimError, TrimResult};

/// Parse `mm:ss` into a number of seconds.
///
/// Exactly two unsigned integer fields separated by a single `:`. The seconds
/// field is not capped at 59, so `"00:75"` is 75 seconds.
pub fn parse_time(time_str: &str) -> TrimResult<u32> {
    let malformed = || TrimError::MalformedTimeFormat {
        time: time_str.to_string(),
    };

    let (minutes, seconds) = time_str.trim().split_once(':').ok_or_else(malformed)?;
    let minutes = parse_field(minutes).ok_or_else(malformed)?;
    let seconds = parse_field(seconds).ok_or_else(malformed)?;

    minutes
        .checked_mul(60)
        .and_then(|m| m.checked_add(seconds))
        .ok_or_else(malformed)
}

/// Format seconds as `mm:ss`, zero padded. Minutes grow past two digits.
pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

fn parse_field(field: &str) -> Option<u32> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}
