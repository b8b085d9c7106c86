//! Stream copy implementation

use std::path::Path;
use std::time::Instant;

use tracing::info;

use crate::adapters::discard::DiscardSink;
use crate::domain::model::{EndPolicy, SourceLayout, StreamRoute, Window};
use crate::engine::bootstrap::{open_destination, open_source};
use crate::engine::relay::{run_relay, RelayEngine, RelayReport};
use crate::engine::seek::SeekPlan;
use crate::engine::{ProbeReport, TrimReport, TrimRequest};
use crate::error::TrimResult;
use crate::ports::{PacketSink, PacketSource};

/// Stream copy trimmer for lossless cuts
///
/// Nothing is decoded or encoded: packets are filtered, retimed and remuxed.
pub struct StreamCopyTrimmer;

impl StreamCopyTrimmer {
    /// Create a trimmer, initializing FFmpeg on first use
    pub fn new() -> TrimResult<Self> {
        crate::init()?;
        Ok(Self)
    }

    /// Cut `[start, end)` out of the input into a new container.
    ///
    /// The window is validated before any container is opened. Containers are
    /// released on every return path.
    pub fn trim(&self, request: &TrimRequest) -> TrimResult<TrimReport> {
        let started = Instant::now();
        let window = Window::from_clock(&request.start, &request.end)?;

        info!(
            input = %request.input.display(),
            output = %request.output.display(),
            %window,
            "Starting trim"
        );

        let mut opened = open_source(&request.input)?;
        let (mut sink, routes) = open_destination(&request.output, &opened)?;
        let (seek, relay) = trim_streams(
            &mut opened.source,
            &mut sink,
            &opened.layout,
            &routes,
            window,
            request.end_policy,
        )?;

        Ok(TrimReport {
            input: request.input.clone(),
            output: Some(request.output.clone()),
            window,
            end_policy: request.end_policy,
            seek,
            relay,
            elapsed_ms: started.elapsed().as_millis(),
        })
    }

    /// Run the whole relay policy against the source without creating output
    pub fn dry_run(&self, request: &TrimRequest) -> TrimResult<TrimReport> {
        let started = Instant::now();
        let window = Window::from_clock(&request.start, &request.end)?;

        info!(input = %request.input.display(), %window, "Starting dry run");

        let mut opened = open_source(&request.input)?;
        let routes = opened.layout.passthrough_routes();
        let mut sink = DiscardSink::new();
        let (seek, relay) = trim_streams(
            &mut opened.source,
            &mut sink,
            &opened.layout,
            &routes,
            window,
            request.end_policy,
        )?;

        Ok(TrimReport {
            input: request.input.clone(),
            output: None,
            window,
            end_policy: request.end_policy,
            seek,
            relay,
            elapsed_ms: started.elapsed().as_millis(),
        })
    }

    /// Describe the source and what a trim would copy from it
    pub fn probe(&self, input: &Path) -> TrimResult<ProbeReport> {
        let opened = open_source(input)?;
        Ok(ProbeReport {
            input: input.to_path_buf(),
            format: opened.source.format_name(),
            duration_seconds: opened.source.duration_seconds(),
            layout: opened.layout.clone(),
        })
    }
}

/// Seek and relay over already bootstrapped containers
pub fn trim_streams<S, K>(
    source: &mut S,
    sink: &mut K,
    layout: &SourceLayout,
    routes: &[StreamRoute],
    window: Window,
    end_policy: EndPolicy,
) -> TrimResult<(SeekPlan, RelayReport)>
where
    S: PacketSource,
    K: PacketSink<S::Packet>,
{
    let seek = SeekPlan::for_window(&window, layout);
    seek.execute(source)?;

    let engine = RelayEngine::new(window, end_policy, routes, layout.primary);
    let relay = run_relay(source, sink, engine, routes)?;
    Ok((seek, relay))
}
