// Ports - Interface definitions (contracts)
//
// The relay engine only sees these traits. The libav adapter implements
// them over real containers; tests implement them in memory.

use thiserror::Error;

use crate::domain::model::{EmitTiming, PacketTiming};
use crate::error::TrimResult;

/// A demuxed packet the relay can inspect and retime
pub trait RelayPacket {
    /// Timing as read from the source
    fn timing(&self) -> PacketTiming;

    /// Overwrite stream index and timestamps for the output container and
    /// drop the source byte position
    fn retime(&mut self, timing: &EmitTiming);
}

/// Read side of a container
pub trait PacketSource {
    type Packet: RelayPacket;

    /// Seek to the nearest keyframe at or before `timestamp`.
    ///
    /// With a stream, `timestamp` is in that stream's time base; without one
    /// it is in microseconds and the demuxer picks its default stream.
    fn seek_backward(&mut self, stream: Option<usize>, timestamp: i64) -> TrimResult<()>;

    /// Next packet in storage order, `None` once input is exhausted
    fn read_packet(&mut self) -> Option<Self::Packet>;
}

/// Muxer-level write failure for a single packet
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct WriteError(pub String);

/// Write side of a container whose header is already written
pub trait PacketSink<P> {
    /// Write one packet in interleaved order
    fn write_packet(&mut self, packet: &mut P) -> Result<(), WriteError>;

    /// Finalize the container
    fn write_trailer(&mut self) -> TrimResult<()>;
}
