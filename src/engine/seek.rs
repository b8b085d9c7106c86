//! Seek planning
//!
//! The source is repositioned at or before the window start so the relay
//! reads from a keyframe. Packets between the seek point and the real start
//! are dropped by the relay, so this only has to be approximately right.

use serde::Serialize;
use tracing::info;

use crate::domain::model::{SourceLayout, TimeBase, Window};
use crate::error::TrimResult;
use crate::ports::PacketSource;

/// Where and in which units to seek
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeekPlan {
    /// Primary stream the timestamp refers to; `None` means microseconds
    pub stream: Option<usize>,
    pub timestamp: i64,
}

impl SeekPlan {
    /// Seek target for the window start, in the primary stream's time base
    /// when there is one
    pub fn for_window(window: &Window, layout: &SourceLayout) -> Self {
        let primary = layout
            .primary
            .and_then(|index| layout.stream(index))
            .filter(|s| s.time_base.is_valid());

        match primary {
            Some(stream) => Self {
                stream: Some(stream.index),
                timestamp: stream.time_base.from_seconds(window.start_seconds()),
            },
            None => Self {
                stream: None,
                timestamp: TimeBase::MICROSECONDS.from_seconds(window.start_seconds()),
            },
        }
    }

    /// Issue the backward seek
    pub fn execute<S: PacketSource>(&self, source: &mut S) -> TrimResult<()> {
        info!(stream = ?self.stream, timestamp = self.timestamp, "Seeking backward to window start");
        source.seek_backward(self.stream, self.timestamp)
    }
}
