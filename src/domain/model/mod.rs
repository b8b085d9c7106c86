// Domain models - Core types and data structures

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TrimError, TrimResult};
use crate::utils::time::parse_time;

/// Rational unit of a stream's timestamps, `num/den` seconds per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBase {
    pub num: i32,
    pub den: i32,
}

impl TimeBase {
    /// Microsecond base used by container-level seeks
    pub const MICROSECONDS: TimeBase = TimeBase::new(1, 1_000_000);

    /// One tick per second
    pub const SECONDS: TimeBase = TimeBase::new(1, 1);

    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// Both terms strictly positive
    pub fn is_valid(&self) -> bool {
        self.num > 0 && self.den > 0
    }

    /// Convert `ts` from this base into `target`, rounding to nearest with
    /// ties away from zero. Invalid bases leave the value untouched.
    pub fn rescale(&self, ts: i64, target: TimeBase) -> i64 {
        if *self == target || !self.is_valid() || !target.is_valid() {
            return ts;
        }

        let numerator = i128::from(ts) * i128::from(self.num) * i128::from(target.den);
        let denominator = i128::from(self.den) * i128::from(target.num);
        let half = denominator / 2;
        let rounded = if numerator >= 0 {
            (numerator + half) / denominator
        } else {
            -((-numerator + half) / denominator)
        };

        rounded.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }

    /// Whole seconds expressed in this base
    pub fn from_seconds(&self, seconds: u32) -> i64 {
        TimeBase::SECONDS.rescale(i64::from(seconds), *self)
    }

    /// Exact comparison of `ts` ticks against whole `seconds`
    pub fn compare_to_seconds(&self, ts: i64, seconds: u32) -> Ordering {
        let lhs = i128::from(ts) * i128::from(self.num);
        let rhs = i128::from(seconds) * i128::from(self.den);
        lhs.cmp(&rhs)
    }

    /// Lossy seconds, for reports only
    pub fn to_seconds_f64(&self, ts: i64) -> f64 {
        if self.den == 0 {
            return 0.0;
        }
        ts as f64 * f64::from(self.num) / f64::from(self.den)
    }
}

impl fmt::Display for TimeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Cut window `[start, end)` in whole seconds
///
/// Only constructible through validation, so `start < end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    start_seconds: u32,
    end_seconds: u32,
}

impl Window {
    pub fn new(start_seconds: u32, end_seconds: u32) -> TrimResult<Self> {
        if start_seconds >= end_seconds {
            return Err(TrimError::InvalidWindow {
                start: start_seconds,
                end: end_seconds,
            });
        }
        Ok(Self {
            start_seconds,
            end_seconds,
        })
    }

    /// Parse two `mm:ss` strings and validate their order
    pub fn from_clock(start: &str, end: &str) -> TrimResult<Self> {
        Self::new(parse_time(start)?, parse_time(end)?)
    }

    pub fn start_seconds(&self) -> u32 {
        self.start_seconds
    }

    pub fn end_seconds(&self) -> u32 {
        self.end_seconds
    }

    pub fn duration_seconds(&self) -> u32 {
        self.end_seconds - self.start_seconds
    }

    /// Timestamp lies at or beyond the end boundary
    pub fn is_past_end(&self, ts: i64, time_base: TimeBase) -> bool {
        time_base.compare_to_seconds(ts, self.end_seconds) != Ordering::Less
    }

    /// Timestamp lies strictly before the start boundary
    pub fn is_before_start(&self, ts: i64, time_base: TimeBase) -> bool {
        time_base.compare_to_seconds(ts, self.start_seconds) == Ordering::Less
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}s, {}s)", self.start_seconds, self.end_seconds)
    }
}

/// Elementary stream category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
    Other,
}

impl MediaKind {
    /// Audio and video are stream-copied; everything else is dropped
    pub fn is_copied(&self) -> bool {
        matches!(self, MediaKind::Video | MediaKind::Audio)
    }
}

/// One source elementary stream as seen at bootstrap
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamDescriptor {
    pub index: usize,
    pub kind: MediaKind,
    pub time_base: TimeBase,
}

/// Source stream topology with the copy decision applied
#[derive(Debug, Clone, Serialize)]
pub struct SourceLayout {
    pub streams: Vec<StreamDescriptor>,
    /// First video stream; drives seeking and keyframe gating
    pub primary: Option<usize>,
}

impl SourceLayout {
    /// Single pass: the first video stream encountered becomes primary
    pub fn classify(streams: Vec<StreamDescriptor>) -> Self {
        let primary = streams
            .iter()
            .find(|s| s.kind == MediaKind::Video)
            .map(|s| s.index);
        Self { streams, primary }
    }

    /// Streams that land in the output, in source order
    pub fn copied(&self) -> impl Iterator<Item = &StreamDescriptor> {
        self.streams.iter().filter(|s| s.kind.is_copied())
    }

    pub fn stream(&self, index: usize) -> Option<&StreamDescriptor> {
        self.streams.iter().find(|s| s.index == index)
    }

    /// Routes that keep every copied stream in its source time base
    pub fn passthrough_routes(&self) -> Vec<StreamRoute> {
        self.copied()
            .enumerate()
            .map(|(output_index, s)| StreamRoute {
                input_index: s.index,
                output_index,
                kind: s.kind,
                input_time_base: s.time_base,
                output_time_base: s.time_base,
            })
            .collect()
    }
}

/// Mapping of one copied source stream to its output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamRoute {
    pub input_index: usize,
    pub output_index: usize,
    pub kind: MediaKind,
    pub input_time_base: TimeBase,
    /// Time base the muxer settled on after writing the header
    pub output_time_base: TimeBase,
}

/// Timing view of a demuxed packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketTiming {
    pub stream_index: usize,
    pub pts: Option<i64>,
    pub dts: Option<i64>,
    pub duration: i64,
    pub is_keyframe: bool,
}

/// Output-side timing for an accepted packet, in the output time base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitTiming {
    pub output_index: usize,
    pub pts: Option<i64>,
    pub dts: Option<i64>,
    pub duration: i64,
}

/// What happens when a packet crosses the window end
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndPolicy {
    /// First crossing packet on any copied stream ends the relay
    #[default]
    #[serde(rename = "stop")]
    StopAtBoundary,
    /// Each stream closes on its own crossing; relay ends when all are closed
    #[serde(rename = "drain")]
    DrainStreams,
}

impl FromStr for EndPolicy {
    type Err = TrimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stop" => Ok(EndPolicy::StopAtBoundary),
            "drain" => Ok(EndPolicy::DrainStreams),
            other => Err(TrimError::config(format!(
                "Invalid end policy: {other}. Valid policies: stop, drain"
            ))),
        }
    }
}

impl fmt::Display for EndPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndPolicy::StopAtBoundary => write!(f, "stop"),
            EndPolicy::DrainStreams => write!(f, "drain"),
        }
    }
}
