//! Command implementations

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::cli::args::{ProbeArgs, TrimArgs};
use crate::config::Settings;
use crate::engine::{ProbeReport, StreamCopyTrimmer, TrimReport};
use crate::utils::time::format_time;

/// Execute the trim command
pub fn trim(settings: &Settings, args: &TrimArgs) -> Result<()> {
    let request = settings.trim_request()?;
    let trimmer = StreamCopyTrimmer::new()?;

    let outcome = if args.dry_run {
        trimmer.dry_run(&request)
    } else {
        trimmer.trim(&request)
    };

    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            if e.touched_output() {
                error!(
                    output = %request.output.display(),
                    "Output may exist but be truncated; probe it before use"
                );
            }
            return Err(e).context("Failed to trim video");
        }
    };

    info!(
        written = report.relay.packets_written,
        elapsed_ms = report.elapsed_ms as u64,
        "Trim completed"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_trim_report(&report);
    }
    Ok(())
}

/// Execute the probe command
pub fn probe(settings: &Settings, args: &ProbeArgs) -> Result<()> {
    let input = settings.input()?;
    let trimmer = StreamCopyTrimmer::new()?;
    let report = trimmer
        .probe(input)
        .with_context(|| format!("Failed to probe {}", input.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_probe_report(&report);
    }
    Ok(())
}

fn print_trim_report(report: &TrimReport) {
    let window = report.window;
    match &report.output {
        Some(output) => println!(
            "Trimmed {} from {} to {} into {}",
            report.input.display(),
            format_time(window.start_seconds()),
            format_time(window.end_seconds()),
            output.display()
        ),
        None => println!(
            "Dry run of {} from {} to {}",
            report.input.display(),
            format_time(window.start_seconds()),
            format_time(window.end_seconds())
        ),
    }

    if let Some(keyframe) = report.relay.first_keyframe_seconds {
        println!("  starts on keyframe at {keyframe:.3}s");
    }
    println!(
        "  {} packets written, {} discarded, ended by {:?}",
        report.relay.packets_written, report.relay.packets_discarded, report.relay.termination
    );
    for stream in &report.relay.streams {
        println!(
            "  #{} <- #{} {:?} {} packets (time base {})",
            stream.output_index, stream.input_index, stream.kind, stream.packets, stream.time_base
        );
    }
}

fn print_probe_report(report: &ProbeReport) {
    println!("{} ({})", report.input.display(), report.format);
    if let Some(duration) = report.duration_seconds {
        println!("  duration {duration:.3}s");
    }
    for stream in &report.layout.streams {
        let role = match (report.layout.primary == Some(stream.index), stream.kind.is_copied()) {
            (true, _) => "copied, primary",
            (false, true) => "copied",
            (false, false) => "dropped",
        };
        println!(
            "  #{} {:?} time base {} [{}]",
            stream.index, stream.kind, stream.time_base, role
        );
    }
}
