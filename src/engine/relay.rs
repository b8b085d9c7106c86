//! Packet relay engine
//!
//! One read loop over the source in storage order drives a two-state machine
//! per copied stream (`AwaitingOrigin -> Flowing`). Each packet is filtered
//! against the window, gated on the first primary keyframe, shifted so the
//! stream starts at zero, repaired for decode order, and handed to the sink.
//! The trailer is written on every exit from the loop.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::domain::model::{
    EmitTiming, EndPolicy, MediaKind, PacketTiming, StreamRoute, TimeBase, Window,
};
use crate::error::{TrimError, TrimResult};
use crate::ports::{PacketSink, PacketSource, RelayPacket};

/// Lifecycle of one copied stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    AwaitingOrigin,
    Flowing,
}

/// Renormalization state of one copied stream
#[derive(Debug, Clone, Default)]
pub struct StreamRenormState {
    origin_pts: Option<i64>,
    origin_dts: Option<i64>,
    /// Output time base; only tracked on the primary stream
    last_emitted_video_dts: Option<i64>,
    closed: bool,
}

impl StreamRenormState {
    pub fn phase(&self) -> StreamPhase {
        if self.origin_pts.is_some() || self.origin_dts.is_some() {
            StreamPhase::Flowing
        } else {
            StreamPhase::AwaitingOrigin
        }
    }
}

/// Why a packet was not forwarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    NotCopied,
    Untimed,
    BeforeWindow,
    AwaitingKeyframe,
    StreamClosed,
}

/// Decision for one packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Discard(DiscardReason),
    Emit(EmitTiming),
    Stop,
}

/// One-shot gate on the primary stream
#[derive(Debug, Clone, Copy)]
struct KeyframeGate {
    stream: usize,
    open: bool,
}

/// Per-packet policy of the relay
#[derive(Debug)]
pub struct RelayEngine {
    window: Window,
    policy: EndPolicy,
    routes: HashMap<usize, StreamRoute>,
    states: HashMap<usize, StreamRenormState>,
    gate: Option<KeyframeGate>,
    open_streams: usize,
}

impl RelayEngine {
    /// `primary` only matters if it is one of the routed streams
    pub fn new(
        window: Window,
        policy: EndPolicy,
        routes: &[StreamRoute],
        primary: Option<usize>,
    ) -> Self {
        let routes: HashMap<usize, StreamRoute> =
            routes.iter().map(|r| (r.input_index, *r)).collect();
        let states = routes
            .keys()
            .map(|&index| (index, StreamRenormState::default()))
            .collect();
        let gate = primary
            .filter(|index| routes.contains_key(index))
            .map(|stream| KeyframeGate {
                stream,
                open: false,
            });

        Self {
            window,
            policy,
            open_streams: routes.len(),
            routes,
            states,
            gate,
        }
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn primary(&self) -> Option<usize> {
        self.gate.map(|g| g.stream)
    }

    pub fn state(&self, input_index: usize) -> Option<&StreamRenormState> {
        self.states.get(&input_index)
    }

    pub fn route(&self, input_index: usize) -> Option<&StreamRoute> {
        self.routes.get(&input_index)
    }

    /// Decide what happens to one packet and advance the stream's state
    pub fn admit(&mut self, packet: &PacketTiming) -> Verdict {
        let index = packet.stream_index;
        let Some(route) = self.routes.get(&index).copied() else {
            return Verdict::Discard(DiscardReason::NotCopied);
        };

        if self.states.get(&index).is_some_and(|s| s.closed) {
            return Verdict::Discard(DiscardReason::StreamClosed);
        }

        // Some packets only carry a decode timestamp
        let Some(presentation) = packet.pts.or(packet.dts) else {
            return Verdict::Discard(DiscardReason::Untimed);
        };

        if self.window.is_past_end(presentation, route.input_time_base) {
            return self.cross_end(index);
        }

        if self.window.is_before_start(presentation, route.input_time_base) {
            return Verdict::Discard(DiscardReason::BeforeWindow);
        }

        let is_primary = match self.gate.as_mut() {
            Some(gate) if gate.stream == index => {
                if !gate.open {
                    if !packet.is_keyframe {
                        return Verdict::Discard(DiscardReason::AwaitingKeyframe);
                    }
                    gate.open = true;
                    debug!(
                        stream = index,
                        pts = presentation,
                        "Keyframe gate opened on primary stream"
                    );
                }
                true
            }
            _ => false,
        };

        let state = self.states.entry(index).or_default();
        Verdict::Emit(renormalize(state, &route, packet, is_primary))
    }

    fn cross_end(&mut self, index: usize) -> Verdict {
        match self.policy {
            EndPolicy::StopAtBoundary => Verdict::Stop,
            EndPolicy::DrainStreams => {
                if let Some(state) = self.states.get_mut(&index) {
                    state.closed = true;
                    self.open_streams -= 1;
                    debug!(stream = index, remaining = self.open_streams, "Stream reached window end");
                }
                if self.open_streams == 0 {
                    Verdict::Stop
                } else {
                    Verdict::Discard(DiscardReason::StreamClosed)
                }
            }
        }
    }
}

fn renormalize(
    state: &mut StreamRenormState,
    route: &StreamRoute,
    packet: &PacketTiming,
    is_primary: bool,
) -> EmitTiming {
    if state.phase() == StreamPhase::AwaitingOrigin {
        // A missing component borrows the other so the first packet lands on 0/0
        state.origin_pts = packet.pts.or(packet.dts);
        state.origin_dts = packet.dts.or(packet.pts);
        debug!(
            stream = route.input_index,
            origin_pts = ?state.origin_pts,
            origin_dts = ?state.origin_dts,
            "Captured stream origin"
        );
    }

    let to_output = |ts: i64| route.input_time_base.rescale(ts, route.output_time_base);
    let mut pts = packet
        .pts
        .zip(state.origin_pts)
        .map(|(ts, origin)| to_output(ts.saturating_sub(origin)));
    let mut dts = packet
        .dts
        .zip(state.origin_dts)
        .map(|(ts, origin)| to_output(ts.saturating_sub(origin)));

    if is_primary {
        if let Some(current) = dts {
            let repaired = match state.last_emitted_video_dts {
                Some(last) if current <= last => {
                    warn!(
                        stream = route.input_index,
                        dts = current,
                        last,
                        "Non-increasing dts on primary stream, bumping"
                    );
                    last + 1
                }
                _ => current,
            };
            dts = Some(repaired);
            state.last_emitted_video_dts = Some(repaired);
        }
    }

    if let (Some(p), Some(d)) = (pts, dts) {
        if p < d {
            pts = Some(d);
        }
    }

    EmitTiming {
        output_index: route.output_index,
        pts,
        dts,
        duration: to_output(packet.duration),
    }
}

/// Why the read loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    EndOfInput,
    EndOfWindow,
    WriteFailed,
}

/// Per output stream counters
#[derive(Debug, Clone, Serialize)]
pub struct StreamReport {
    pub input_index: usize,
    pub output_index: usize,
    pub kind: MediaKind,
    pub time_base: TimeBase,
    pub packets: u64,
    pub first_source_pts: Option<i64>,
    pub last_pts: Option<i64>,
}

/// Outcome of a completed relay
#[derive(Debug, Clone, Serialize)]
pub struct RelayReport {
    pub packets_read: u64,
    pub packets_written: u64,
    pub packets_discarded: u64,
    pub termination: Termination,
    /// Source time of the keyframe the output starts on
    pub first_keyframe_seconds: Option<f64>,
    pub streams: Vec<StreamReport>,
}

impl RelayReport {
    fn new(routes: &[StreamRoute]) -> Self {
        let mut streams: Vec<StreamReport> = routes
            .iter()
            .map(|r| StreamReport {
                input_index: r.input_index,
                output_index: r.output_index,
                kind: r.kind,
                time_base: r.output_time_base,
                packets: 0,
                first_source_pts: None,
                last_pts: None,
            })
            .collect();
        streams.sort_by_key(|s| s.output_index);

        Self {
            packets_read: 0,
            packets_written: 0,
            packets_discarded: 0,
            termination: Termination::EndOfInput,
            first_keyframe_seconds: None,
            streams,
        }
    }

    fn record_emit(&mut self, source: &PacketTiming, emitted: &EmitTiming) {
        self.packets_written += 1;
        if let Some(stream) = self
            .streams
            .iter_mut()
            .find(|s| s.output_index == emitted.output_index)
        {
            stream.packets += 1;
            if stream.first_source_pts.is_none() {
                stream.first_source_pts = source.pts.or(source.dts);
            }
            stream.last_pts = emitted.pts.or(stream.last_pts);
        }
    }
}

/// Drive packets from `source` into `sink` until input ends, the window is
/// left, or a write fails; then write the trailer.
///
/// A write failure still finalizes the container and is then reported as
/// [`TrimError::PacketWrite`].
pub fn run_relay<S, K>(
    source: &mut S,
    sink: &mut K,
    mut engine: RelayEngine,
    routes: &[StreamRoute],
) -> TrimResult<RelayReport>
where
    S: PacketSource,
    K: PacketSink<S::Packet>,
{
    let mut report = RelayReport::new(routes);
    let mut write_failure = None;

    info!(window = %engine.window(), primary = ?engine.primary(), "Relaying packets");

    while let Some(mut packet) = source.read_packet() {
        report.packets_read += 1;
        let timing = packet.timing();

        let emit = match engine.admit(&timing) {
            Verdict::Emit(emit) => emit,
            Verdict::Discard(reason) => {
                trace!(stream = timing.stream_index, ?reason, "Discarding packet");
                report.packets_discarded += 1;
                continue;
            }
            Verdict::Stop => {
                debug!(
                    stream = timing.stream_index,
                    pts = ?timing.pts,
                    "Window end reached"
                );
                report.termination = Termination::EndOfWindow;
                break;
            }
        };

        if report.first_keyframe_seconds.is_none() && engine.primary() == Some(timing.stream_index)
        {
            if let Some(route) = engine.route(timing.stream_index) {
                report.first_keyframe_seconds = timing
                    .pts
                    .or(timing.dts)
                    .map(|ts| route.input_time_base.to_seconds_f64(ts));
            }
        }

        packet.retime(&emit);
        trace!(
            stream = emit.output_index,
            pts = ?emit.pts,
            dts = ?emit.dts,
            duration = emit.duration,
            "Writing packet"
        );

        if let Err(e) = sink.write_packet(&mut packet) {
            warn!(stream = emit.output_index, error = %e, "Error writing packet, finalizing early");
            report.termination = Termination::WriteFailed;
            write_failure = Some(TrimError::PacketWrite {
                stream: emit.output_index,
                packet: report.packets_written,
                message: e.0,
            });
            break;
        }
        report.record_emit(&timing, &emit);
    }

    let trailer = sink.write_trailer();

    info!(
        read = report.packets_read,
        written = report.packets_written,
        discarded = report.packets_discarded,
        termination = ?report.termination,
        "Relay finished"
    );

    match (write_failure, trailer) {
        (Some(failure), Err(trailer_error)) => {
            warn!(error = %trailer_error, "Trailer failed after packet write error");
            Err(failure)
        }
        (Some(failure), Ok(())) => Err(failure),
        (None, Err(trailer_error)) => Err(trailer_error),
        (None, Ok(())) => Ok(report),
    }
}
