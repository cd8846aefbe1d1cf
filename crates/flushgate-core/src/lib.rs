//! # flushgate-core
//!
//! A size-bounded batching write buffer. Any number of producer threads
//! append event payloads through a [`Writer`]; a single background
//! [`Flusher`] hands the accumulated batch to a [`Sink`] whenever it reaches
//! the configured byte threshold.
//!
//! ## Modules
//!
//! - [`buffer`] - The byte accumulator
//! - [`gate`] - Mutex + condition variable guarding the buffer
//! - [`writer`] - Producer-facing append API
//! - [`flusher`] - Background flush loop and lifecycle
//! - [`sink`] - The flush destination trait
//! - [`config`] - Gate configuration
//! - [`stats`] - Counters
//!
//! ## Example
//!
//! ```
//! use flushgate_core::sink::from_fn;
//! use flushgate_core::{GateConfig, spawn};
//!
//! let (writer, flusher) = spawn(
//!     GateConfig::new(8),
//!     from_fn(|id, batch| {
//!         println!("{id}: {} bytes", batch.len());
//!         Ok(())
//!     }),
//! )
//! .unwrap();
//!
//! writer.append(b"0123").unwrap();
//! writer.append(b"4567").unwrap(); // reaches the threshold, wakes the flusher
//!
//! flusher.shutdown().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod buffer;
pub mod config;
pub mod flusher;
pub mod gate;
pub mod sink;
pub mod stats;
pub mod writer;

use std::sync::Arc;

pub use config::{FlushMode, GateConfig};
pub use flusher::Flusher;
pub use gate::BatchGate;
pub use sink::Sink;
pub use stats::{GateStats, StatsSnapshot};
pub use writer::Writer;

pub use flushgate_common::types::BatchId;
pub use flushgate_common::utils::error::{AppendError, Error, Result, SinkError};

/// Builds a gate from `config` and starts its flusher.
///
/// Returns the producer handle and the flusher's lifecycle handle.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the flusher thread
/// cannot be spawned.
pub fn spawn<S: Sink>(config: GateConfig, sink: S) -> Result<(Writer, Flusher)> {
    let gate = Arc::new(BatchGate::new(&config)?);
    let flusher = Flusher::spawn(Arc::clone(&gate), sink, &config)?;
    tracing::debug!(
        threshold = config.flush_threshold,
        mode = ?config.flush_mode,
        "batch gate started"
    );
    Ok((Writer::new(gate), flusher))
}
