//! In-memory containers for driving the relay without media files

#![allow(dead_code)]

use streamtrim::domain::model::{
    EmitTiming, MediaKind, PacketTiming, SourceLayout, StreamDescriptor, StreamRoute, TimeBase,
};
use streamtrim::error::{TrimError, TrimResult};
use streamtrim::ports::{PacketSink, PacketSource, RelayPacket, WriteError};

pub const VIDEO_TB: TimeBase = TimeBase::new(1, 15_360);
pub const AUDIO_TB: TimeBase = TimeBase::new(1, 48_000);
pub const SUBTITLE_TB: TimeBase = TimeBase::new(1, 1000);

/// Ticks per video frame at 30 fps
pub const FRAME_TICKS: i64 = 512;
/// Samples per audio packet
pub const AUDIO_TICKS: i64 = 1024;

pub const SUBTITLE_STREAM: usize = 0;
pub const VIDEO_STREAM: usize = 1;
pub const AUDIO_STREAM: usize = 2;

#[derive(Debug, Clone)]
pub struct FakePacket {
    pub timing: PacketTiming,
    pub emitted: Option<EmitTiming>,
}

impl RelayPacket for FakePacket {
    fn timing(&self) -> PacketTiming {
        self.timing
    }

    fn retime(&mut self, timing: &EmitTiming) {
        self.emitted = Some(*timing);
    }
}

/// Source that replays a fixed packet list and emulates backward seeks
pub struct FakeSource {
    packets: Vec<PacketTiming>,
    time_bases: Vec<(usize, TimeBase)>,
    cursor: usize,
    pub seeks: Vec<(Option<usize>, i64)>,
    pub fail_seek: bool,
}

impl FakeSource {
    pub fn new(movie: &Movie) -> Self {
        Self {
            packets: movie.packets.clone(),
            time_bases: movie
                .layout
                .streams
                .iter()
                .map(|s| (s.index, s.time_base))
                .collect(),
            cursor: 0,
            seeks: Vec::new(),
            fail_seek: false,
        }
    }

    fn time_base(&self, stream: usize) -> TimeBase {
        self.time_bases
            .iter()
            .find(|(index, _)| *index == stream)
            .map(|(_, tb)| *tb)
            .unwrap_or(TimeBase::MICROSECONDS)
    }

    fn seconds(&self, packet: &PacketTiming) -> f64 {
        let ts = packet.pts.or(packet.dts).unwrap_or(i64::MIN);
        self.time_base(packet.stream_index).to_seconds_f64(ts)
    }
}

impl PacketSource for FakeSource {
    type Packet = FakePacket;

    fn seek_backward(&mut self, stream: Option<usize>, timestamp: i64) -> TrimResult<()> {
        self.seeks.push((stream, timestamp));
        if self.fail_seek {
            return Err(TrimError::SeekFailure {
                target: timestamp,
                message: "index is corrupt".to_string(),
            });
        }

        let target = match stream {
            Some(index) => self.time_base(index).to_seconds_f64(timestamp),
            None => TimeBase::MICROSECONDS.to_seconds_f64(timestamp),
        };
        self.cursor = self
            .packets
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_keyframe && stream.map_or(true, |s| p.stream_index == s))
            .filter(|(_, p)| self.seconds(p) <= target)
            .map(|(position, _)| position)
            .last()
            .unwrap_or(0);
        Ok(())
    }

    fn read_packet(&mut self) -> Option<FakePacket> {
        let timing = *self.packets.get(self.cursor)?;
        self.cursor += 1;
        Some(FakePacket {
            timing,
            emitted: None,
        })
    }
}

/// Sink that records what it was given and can fail on demand
#[derive(Default)]
pub struct FakeSink {
    pub written: Vec<(PacketTiming, EmitTiming)>,
    pub fail_at: Option<usize>,
    pub trailer_written: bool,
}

impl FakeSink {
    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::default()
        }
    }

    /// Emitted timings of one output stream, in write order
    pub fn stream(&self, output_index: usize) -> Vec<(PacketTiming, EmitTiming)> {
        self.written
            .iter()
            .filter(|(_, emit)| emit.output_index == output_index)
            .copied()
            .collect()
    }
}

impl PacketSink<FakePacket> for FakeSink {
    fn write_packet(&mut self, packet: &mut FakePacket) -> Result<(), WriteError> {
        if self.fail_at == Some(self.written.len()) {
            return Err(WriteError("No space left on device".to_string()));
        }
        let emitted = packet
            .emitted
            .ok_or_else(|| WriteError("packet was not retimed".to_string()))?;
        self.written.push((packet.timing, emitted));
        Ok(())
    }

    fn write_trailer(&mut self) -> TrimResult<()> {
        self.trailer_written = true;
        Ok(())
    }
}

/// Packet list plus topology
#[derive(Debug, Clone)]
pub struct Movie {
    pub layout: SourceLayout,
    pub packets: Vec<PacketTiming>,
}

impl Movie {
    pub fn routes(&self) -> Vec<StreamRoute> {
        self.layout.passthrough_routes()
    }

    pub fn count(&self, stream: usize) -> usize {
        self.packets.iter().filter(|p| p.stream_index == stream).count()
    }

    /// Rebuild a source from what a sink received, as a demuxer would see it
    pub fn from_output(sink: &FakeSink, routes: &[StreamRoute]) -> Self {
        let streams = routes
            .iter()
            .map(|r| StreamDescriptor {
                index: r.output_index,
                kind: r.kind,
                time_base: r.output_time_base,
            })
            .collect();
        let packets = sink
            .written
            .iter()
            .map(|(source, emit)| PacketTiming {
                stream_index: emit.output_index,
                pts: emit.pts,
                dts: emit.dts,
                duration: emit.duration,
                is_keyframe: source.is_keyframe,
            })
            .collect();
        Self {
            layout: SourceLayout::classify(streams),
            packets,
        }
    }
}

/// Builder for a 30 fps video + 48 kHz audio + subtitle movie
pub struct MovieBuilder {
    seconds: u32,
    gop_seconds: u32,
    audio_lag_ms: i64,
    with_video: bool,
    /// Presentation delay of video frames over decode order, in frames
    video_delay_frames: i64,
}

impl MovieBuilder {
    pub fn new(seconds: u32) -> Self {
        Self {
            seconds,
            gop_seconds: 2,
            audio_lag_ms: 0,
            with_video: true,
            video_delay_frames: 0,
        }
    }

    pub fn gop_seconds(mut self, gop_seconds: u32) -> Self {
        self.gop_seconds = gop_seconds;
        self
    }

    /// Store audio this many milliseconds later than its presentation time
    pub fn audio_lag_ms(mut self, lag: i64) -> Self {
        self.audio_lag_ms = lag;
        self
    }

    pub fn without_video(mut self) -> Self {
        self.with_video = false;
        self
    }

    pub fn video_delay_frames(mut self, frames: i64) -> Self {
        self.video_delay_frames = frames;
        self
    }

    pub fn build(self) -> Movie {
        let mut streams = vec![StreamDescriptor {
            index: SUBTITLE_STREAM,
            kind: MediaKind::Other,
            time_base: SUBTITLE_TB,
        }];
        // (storage order key in microseconds, packet)
        let mut timeline: Vec<(i64, PacketTiming)> = Vec::new();

        for second in (0..self.seconds).step_by(5) {
            let ms = i64::from(second) * 1000;
            timeline.push((
                ms * 1000,
                PacketTiming {
                    stream_index: SUBTITLE_STREAM,
                    pts: Some(ms),
                    dts: Some(ms),
                    duration: 2000,
                    is_keyframe: true,
                },
            ));
        }

        if self.with_video {
            streams.push(StreamDescriptor {
                index: VIDEO_STREAM,
                kind: MediaKind::Video,
                time_base: VIDEO_TB,
            });
            let frames = i64::from(self.seconds) * 30;
            let gop = i64::from(self.gop_seconds) * 30;
            for frame in 0..frames {
                let dts = frame * FRAME_TICKS;
                let pts = dts + self.video_delay_frames * FRAME_TICKS;
                timeline.push((
                    VIDEO_TB.rescale(dts, TimeBase::MICROSECONDS),
                    PacketTiming {
                        stream_index: VIDEO_STREAM,
                        pts: Some(pts),
                        dts: Some(dts),
                        duration: FRAME_TICKS,
                        is_keyframe: frame % gop == 0,
                    },
                ));
            }
        }

        streams.push(StreamDescriptor {
            index: AUDIO_STREAM,
            kind: MediaKind::Audio,
            time_base: AUDIO_TB,
        });
        let samples = i64::from(self.seconds) * 48_000;
        let mut ts = 0;
        while ts < samples {
            timeline.push((
                AUDIO_TB.rescale(ts, TimeBase::MICROSECONDS) + self.audio_lag_ms * 1000,
                PacketTiming {
                    stream_index: AUDIO_STREAM,
                    pts: Some(ts),
                    dts: Some(ts),
                    duration: AUDIO_TICKS,
                    is_keyframe: true,
                },
            ));
            ts += AUDIO_TICKS;
        }

        timeline.sort_by_key(|(order, _)| *order);
        Movie {
            layout: SourceLayout::classify(streams),
            packets: timeline.into_iter().map(|(_, p)| p).collect(),
        }
    }
}
