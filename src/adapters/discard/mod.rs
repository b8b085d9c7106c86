// Discard sink - accepts packets without writing anything, for dry runs

use tracing::debug;

use crate::error::TrimResult;
use crate::ports::{PacketSink, WriteError};

/// Sink that only counts what it is given
#[derive(Debug, Default)]
pub struct DiscardSink {
    packets: u64,
    finalized: bool,
}

impl DiscardSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn packets(&self) -> u64 {
        self.packets
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

impl<P> PacketSink<P> for DiscardSink {
    fn write_packet(&mut self, _packet: &mut P) -> Result<(), WriteError> {
        self.packets += 1;
        Ok(())
    }

    fn write_trailer(&mut self) -> TrimResult<()> {
        debug!(packets = self.packets, "Dry run complete, nothing written");
        self.finalized = true;
        Ok(())
    }
}
