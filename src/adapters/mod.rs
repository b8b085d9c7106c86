// Adapters - External system implementations

pub mod discard;
pub mod libav;

// Re-export adapters
pub use discard::DiscardSink;
pub use libav::{LibavPacket, LibavSink, LibavSource};
