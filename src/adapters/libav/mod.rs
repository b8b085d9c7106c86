//! Container adapter using libav bindings
//!
//! Wraps `ffmpeg-next` input and output contexts behind the relay ports.
//! Handles are released when the wrappers drop: the output's I/O handle is
//! closed before its context is freed, and the input is always closed, on
//! every exit path.

use std::ffi::CString;
use std::os::raw::c_int;
use std::path::{Path, PathBuf};
use std::ptr;

use ffmpeg_next as ffmpeg;
use ffmpeg::codec;
use ffmpeg::format::context::{Input, Output};
use ffmpeg::media;
use tracing::{debug, warn};

use crate::domain::model::{
    EmitTiming, MediaKind, PacketTiming, SourceLayout, StreamDescriptor, StreamRoute, TimeBase,
};
use crate::error::{TrimError, TrimResult};
use crate::ports::{PacketSink, PacketSource, RelayPacket, WriteError};

impl From<ffmpeg::Rational> for TimeBase {
    fn from(r: ffmpeg::Rational) -> Self {
        TimeBase::new(r.numerator(), r.denominator())
    }
}

impl From<media::Type> for MediaKind {
    fn from(medium: media::Type) -> Self {
        match medium {
            media::Type::Video => MediaKind::Video,
            media::Type::Audio => MediaKind::Audio,
            _ => MediaKind::Other,
        }
    }
}

/// Demuxed packet
pub struct LibavPacket(ffmpeg::Packet);

impl RelayPacket for LibavPacket {
    fn timing(&self) -> PacketTiming {
        PacketTiming {
            stream_index: self.0.stream(),
            pts: self.0.pts(),
            dts: self.0.dts(),
            duration: self.0.duration(),
            is_keyframe: self.0.is_key(),
        }
    }

    fn retime(&mut self, timing: &EmitTiming) {
        self.0.set_stream(timing.output_index);
        self.0.set_pts(timing.pts);
        self.0.set_dts(timing.dts);
        self.0.set_duration(timing.duration);
        self.0.set_position(-1);
    }
}

/// Opened and probed source container
pub struct LibavSource {
    path: PathBuf,
    ictx: Input,
}

impl LibavSource {
    /// Open the container and probe stream metadata
    pub fn open(path: &Path) -> TrimResult<Self> {
        let ictx = ffmpeg::format::input(&path).map_err(|e| TrimError::SourceOpen {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        debug!(
            path = %path.display(),
            format = ictx.format().name(),
            streams = ictx.nb_streams(),
            "Opened input"
        );

        Ok(Self {
            path: path.to_path_buf(),
            ictx,
        })
    }

    pub fn format_name(&self) -> String {
        self.ictx.format().name().to_string()
    }

    /// Container duration in seconds, when the demuxer knows it
    pub fn duration_seconds(&self) -> Option<f64> {
        let duration = self.ictx.duration();
        (duration > 0).then(|| TimeBase::MICROSECONDS.to_seconds_f64(duration))
    }

    /// Stream topology in source index order
    pub fn layout(&self) -> SourceLayout {
        let streams = self
            .ictx
            .streams()
            .map(|stream| StreamDescriptor {
                index: stream.index(),
                kind: stream.parameters().medium().into(),
                time_base: stream.time_base().into(),
            })
            .collect();
        SourceLayout::classify(streams)
    }
}

impl PacketSource for LibavSource {
    type Packet = LibavPacket;

    fn seek_backward(&mut self, stream: Option<usize>, timestamp: i64) -> TrimResult<()> {
        let failure = |e: ffmpeg::Error| TrimError::SeekFailure {
            target: timestamp,
            message: e.to_string(),
        };

        match stream {
            Some(index) => {
                let index = c_int::try_from(index).map_err(|_| TrimError::SeekFailure {
                    target: timestamp,
                    message: format!("stream index {index} out of range"),
                })?;
                // SAFETY: the context is open for the lifetime of `self`
                let ret = unsafe {
                    ffmpeg::ffi::av_seek_frame(
                        self.ictx.as_mut_ptr(),
                        index,
                        timestamp,
                        ffmpeg::ffi::AVSEEK_FLAG_BACKWARD as c_int,
                    )
                };
                if ret < 0 {
                    return Err(failure(ffmpeg::Error::from(ret)));
                }
                Ok(())
            }
            None => self.ictx.seek(timestamp, ..=timestamp).map_err(failure),
        }
    }

    fn read_packet(&mut self) -> Option<LibavPacket> {
        let mut packet = ffmpeg::Packet::empty();
        match packet.read(&mut self.ictx) {
            Ok(()) => Some(LibavPacket(packet)),
            Err(ffmpeg::Error::Eof) => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Read error, treating as end of input");
                None
            }
        }
    }
}

impl Drop for LibavSource {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), "Closing input");
    }
}

/// Output container with its header written
pub struct LibavSink {
    path: PathBuf,
    octx: Output,
}

impl LibavSink {
    /// Mirror every copied source stream into a new container at `path` and
    /// write its header. Codec parameters and time bases are copied, the codec
    /// tag is left to the muxer and no codec is opened.
    pub fn create(
        path: &Path,
        source: &LibavSource,
        layout: &SourceLayout,
    ) -> TrimResult<(Self, Vec<StreamRoute>)> {
        let display = path.display().to_string();
        let write_error = |message: String| TrimError::OutputWrite {
            path: display.clone(),
            message,
        };

        if !has_muxer_for(path) {
            return Err(TrimError::OutputFormatUnresolvable {
                path: path.display().to_string(),
            });
        }

        let mut octx = ffmpeg::format::output(&path)
            .map_err(|e| write_error(format!("open failed: {e}")))?;

        let mut pending = Vec::new();
        for descriptor in layout.copied() {
            let input = source.ictx.stream(descriptor.index).ok_or_else(|| {
                write_error(format!("source stream {} disappeared", descriptor.index))
            })?;

            let mut output = octx
                .add_stream(ffmpeg::encoder::find(codec::Id::None))
                .map_err(|e| write_error(format!("add stream failed: {e}")))?;
            output.set_parameters(input.parameters());
            // Let the muxer pick a tag valid for its own container
            // SAFETY: codecpar is allocated with the stream
            unsafe {
                (*(*output.as_mut_ptr()).codecpar).codec_tag = 0;
            }
            output.set_time_base(input.time_base());

            debug!(
                input = descriptor.index,
                output = output.index(),
                kind = ?descriptor.kind,
                time_base = %descriptor.time_base,
                "Mapped stream"
            );
            pending.push((descriptor.clone(), output.index()));
        }

        octx.write_header()
            .map_err(|e| write_error(format!("header write failed: {e}")))?;

        // The muxer may have picked its own time bases while writing the header
        let mut routes = Vec::with_capacity(pending.len());
        for (descriptor, output_index) in pending {
            let output_time_base = octx
                .stream(output_index)
                .map(|s| TimeBase::from(s.time_base()))
                .ok_or_else(|| write_error(format!("output stream {output_index} missing")))?;
            if output_time_base != descriptor.time_base {
                debug!(
                    output = output_index,
                    from = %descriptor.time_base,
                    to = %output_time_base,
                    "Muxer changed stream time base"
                );
            }
            routes.push(StreamRoute {
                input_index: descriptor.index,
                output_index,
                kind: descriptor.kind,
                input_time_base: descriptor.time_base,
                output_time_base,
            });
        }

        Ok((
            Self {
                path: path.to_path_buf(),
                octx,
            },
            routes,
        ))
    }
}

impl PacketSink<LibavPacket> for LibavSink {
    fn write_packet(&mut self, packet: &mut LibavPacket) -> Result<(), WriteError> {
        packet
            .0
            .write_interleaved(&mut self.octx)
            .map_err(|e| WriteError(e.to_string()))
    }

    fn write_trailer(&mut self) -> TrimResult<()> {
        self.octx
            .write_trailer()
            .map_err(|e| TrimError::OutputWrite {
                path: self.path.display().to_string(),
                message: format!("trailer write failed: {e}"),
            })
    }
}

impl Drop for LibavSink {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), "Closing output");
    }
}

/// Whether libavformat can guess a muxer from the path's extension
fn has_muxer_for(path: &Path) -> bool {
    let Ok(filename) = CString::new(path.to_string_lossy().as_bytes()) else {
        return false;
    };
    // SAFETY: av_guess_format only reads the NUL-terminated filename
    let format = unsafe { ffmpeg::ffi::av_guess_format(ptr::null(), filename.as_ptr(), ptr::null()) };
    !format.is_null()
}
