//! Container bootstrap
//!
//! Opens the source, records its stream topology and picks the primary
//! stream, then mirrors the copied streams into a fresh output container.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::adapters::libav::{LibavSink, LibavSource};
use crate::domain::model::{SourceLayout, StreamRoute};
use crate::error::TrimResult;

/// Source container plus its classified topology
pub struct OpenedSource {
    pub source: LibavSource,
    pub layout: SourceLayout,
}

/// Open and probe the source; fails with `SourceOpen`
pub fn open_source(path: &Path) -> TrimResult<OpenedSource> {
    let source = LibavSource::open(path)?;
    let layout = source.layout();

    for stream in &layout.streams {
        debug!(
            index = stream.index,
            kind = ?stream.kind,
            time_base = %stream.time_base,
            copied = stream.kind.is_copied(),
            "Source stream"
        );
    }

    match layout.primary {
        Some(index) => info!(primary = index, "Primary video stream selected"),
        None => warn!("No video stream; keyframe gating disabled"),
    }

    Ok(OpenedSource { source, layout })
}

/// Create the output container and write its header.
///
/// Fails with `OutputFormatUnresolvable` or `OutputWrite`. Anything opened
/// before the failure is released when the partial sink drops.
pub fn open_destination(
    path: &Path,
    opened: &OpenedSource,
) -> TrimResult<(LibavSink, Vec<StreamRoute>)> {
    let (sink, routes) = LibavSink::create(path, &opened.source, &opened.layout)?;
    info!(
        path = %path.display(),
        streams = routes.len(),
        "Output header written"
    );
    Ok((sink, routes))
}
