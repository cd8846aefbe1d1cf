//! Load generator.

use anyhow::{Context, Result};
use flushgate_adapters::sinks::NullSink;
use flushgate_adapters::storage::batch_file::{BatchFileConfig, BatchFileSink, SyncMode};
use flushgate_core::{AppendError, FlushMode, GateConfig, Sink, StatsSnapshot, Writer, spawn};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::output::{self, Format};
use crate::{LoadArgs, OutputFormat};

/// Retry policy layered over `Writer::append`.
///
/// The gate itself never retries; a rejected append is the caller's problem.
#[derive(Clone, Copy)]
struct RetryPolicy {
    max_retries: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// Appends `payload`, retrying capacity rejections up to `max_retries`
    /// times. Every retry is counted in `retries`.
    fn append(&self, writer: &Writer, payload: &[u8], retries: &AtomicU64) -> Result<(), AppendError> {
        let mut attempt = 0;
        loop {
            match writer.append(payload) {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    retries.fetch_add(1, Ordering::Relaxed);
                    thread::sleep(self.backoff);
                }
                result => return result,
            }
        }
    }
}

/// Result of a load run.
#[derive(Serialize)]
struct LoadReport {
    threshold: usize,
    mode: FlushMode,
    producers: usize,
    events_per_producer: usize,
    event_size: usize,
    output: Option<String>,
    elapsed_ms: u64,
    events_per_sec: f64,
    retries: u64,
    events_dropped: u64,
    residual_bytes: usize,
    stats: StatsSnapshot,
}

/// Run the load generator.
pub fn run(args: &LoadArgs, format: OutputFormat, quiet: bool) -> Result<()> {
    let config = GateConfig::new(args.threshold).with_flush_mode(args.mode.into());
    config.validate()?;

    let report = match &args.output {
        Some(path) => {
            let file_config = BatchFileConfig {
                sync_mode: if args.sync {
                    SyncMode::Sync
                } else {
                    SyncMode::Flush
                },
                truncate: true,
            };
            let sink = BatchFileSink::open(path, file_config)
                .with_context(|| format!("failed to open batch file {}", path.display()))?;
            drive(args, config, sink, quiet)?
        }
        None => drive(args, config, NullSink::new(), quiet)?,
    };

    if report.events_dropped > 0 {
        output::warning(
            &format!(
                "{} events were dropped after {} retries each",
                report.events_dropped, args.retries
            ),
            quiet,
        );
    }

    let fmt: Format = format.into();
    match fmt {
        Format::Json => output::print_json(&report, quiet)?,
        Format::Table => {
            let items = vec![
                ("Threshold", output::format_bytes(report.threshold as u64)),
                ("Mode", format!("{:?}", report.mode)),
                ("Producers", report.producers.to_string()),
                ("Events/Producer", report.events_per_producer.to_string()),
                ("Event Size", output::format_bytes(report.event_size as u64)),
                (
                    "Output",
                    report.output.clone().unwrap_or_else(|| "(discarded)".to_string()),
                ),
                ("Elapsed", format!("{} ms", report.elapsed_ms)),
                ("Events/sec", format!("{:.0}", report.events_per_sec)),
                ("Events Accepted", report.stats.events_accepted.to_string()),
                ("Appends Rejected", report.stats.appends_rejected.to_string()),
                ("Retries", report.retries.to_string()),
                ("Events Dropped", report.events_dropped.to_string()),
                ("Batches Flushed", report.stats.batches_flushed.to_string()),
                ("Bytes Flushed", output::format_bytes(report.stats.bytes_flushed)),
                ("Batches Failed", report.stats.batches_failed.to_string()),
                ("Bytes Lost", output::format_bytes(report.stats.bytes_dropped)),
                ("Residual", output::format_bytes(report.residual_bytes as u64)),
            ];
            output::print_key_value_table(&items, quiet);
        }
    }

    output::success("Load complete", quiet);
    Ok(())
}

fn drive<S: Sink>(args: &LoadArgs, config: GateConfig, sink: S, quiet: bool) -> Result<LoadReport> {
    let mode = config.flush_mode;
    let threshold = config.flush_threshold;
    output::status(
        &format!(
            "Running {} producers x {} events of {} bytes into a {} sink...",
            args.producers,
            args.events,
            args.event_size,
            sink.name()
        ),
        quiet,
    );

    let (writer, flusher) = spawn(config, sink)?;
    let policy = RetryPolicy {
        max_retries: args.retries,
        backoff: Duration::from_millis(args.backoff_ms),
    };
    let retries = AtomicU64::new(0);
    let dropped = AtomicU64::new(0);

    let started = Instant::now();
    thread::scope(|s| {
        for producer in 0..args.producers {
            let writer = writer.clone();
            let retries = &retries;
            let dropped = &dropped;
            s.spawn(move || {
                let payload = vec![b'a' + (producer % 26) as u8; args.event_size];
                for _ in 0..args.events {
                    if let Err(e) = policy.append(&writer, &payload, retries) {
                        tracing::debug!(producer, "giving up on event: {}", e);
                        dropped.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        }
    });
    let elapsed = started.elapsed();

    let residual = flusher.shutdown()?;
    let stats = writer.stats();
    tracing::info!(
        batches = stats.batches_flushed,
        bytes = stats.bytes_flushed,
        residual = residual.len(),
        "load finished"
    );

    Ok(LoadReport {
        threshold,
        mode,
        producers: args.producers,
        events_per_producer: args.events,
        event_size: args.event_size,
        output: args.output.as_ref().map(|p| p.display().to_string()),
        elapsed_ms: elapsed.as_millis() as u64,
        events_per_sec: stats.events_accepted as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
        retries: retries.into_inner(),
        events_dropped: dropped.into_inner(),
        residual_bytes: residual.len(),
        stats,
    })
}
