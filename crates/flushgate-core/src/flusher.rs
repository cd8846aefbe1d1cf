//! The background flush loop and its lifecycle handle.
//!
//! The loop runs on a dedicated thread:
//!
//! 1. Lock the gate.
//! 2. Wait on the ready condition while the batch is below the threshold.
//! 3. Take the batch (this resets the buffer) and hand it to the sink.
//! 4. On sink failure, log, count, drop the batch. No retry.
//! 5. Unlock and repeat.
//!
//! [`Flusher::shutdown`] closes the gate, joins the thread and returns the
//! bytes that never reached the threshold. They are not flushed.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use bytes::Bytes;
use parking_lot::MutexGuard;

use crate::config::{FlushMode, GateConfig};
use crate::gate::BatchGate;
use crate::sink::Sink;
use crate::stats::StatsSnapshot;
use flushgate_common::types::BatchId;
use flushgate_common::utils::error::{Error, Result};

/// Owns the flusher thread.
///
/// Dropping a running `Flusher` stops it like [`shutdown`](Self::shutdown)
/// but discards the residual bytes.
pub struct Flusher {
    gate: Arc<BatchGate>,
    handle: Option<JoinHandle<()>>,
    mode: FlushMode,
}

impl Flusher {
    /// Starts the flush loop for `gate` on a new named thread.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if the thread cannot be created.
    pub fn spawn<S: Sink>(gate: Arc<BatchGate>, sink: S, config: &GateConfig) -> Result<Self> {
        let mode = config.flush_mode;
        let handle = {
            let gate = Arc::clone(&gate);
            thread::Builder::new()
                .name(config.thread_name.clone())
                .spawn(move || run(&gate, sink, mode))
                .map_err(Error::Spawn)?
        };

        Ok(Self {
            gate,
            handle: Some(handle),
            mode,
        })
    }

    /// The flush mode this loop was started with.
    #[must_use]
    pub fn mode(&self) -> FlushMode {
        self.mode
    }

    /// Returns true while the flusher thread is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.gate.stats().snapshot()
    }

    /// Stops the loop and returns the unflushed residual.
    ///
    /// A batch already at the threshold when the gate closes is still
    /// flushed; only the sub-threshold remainder is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FlusherPanicked`] if the sink panicked. The residual
    /// is lost in that case.
    pub fn shutdown(mut self) -> Result<Bytes> {
        self.stop()?;
        Ok(self.gate.take_residual())
    }

    fn stop(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        self.gate.close();
        handle.join().map_err(|_| Error::FlusherPanicked)
    }
}

impl Drop for Flusher {
    fn drop(&mut self) {
        if self.handle.is_none() {
            return;
        }
        if let Err(e) = self.stop() {
            tracing::error!("Error stopping flusher: {}", e);
            return;
        }
        let residual = self.gate.take_residual();
        if !residual.is_empty() {
            tracing::warn!(
                bytes = residual.len(),
                "flusher dropped without shutdown; discarding residual bytes"
            );
        }
    }
}

impl std::fmt::Debug for Flusher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flusher")
            .field("mode", &self.mode)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

/// Closes the gate when the loop exits, including by panic, so writers stop
/// feeding a gate nobody drains.
struct CloseOnExit<'a>(&'a BatchGate);

impl Drop for CloseOnExit<'_> {
    fn drop(&mut self) {
        self.0.close();
    }
}

fn run<S: Sink>(gate: &BatchGate, mut sink: S, mode: FlushMode) {
    let _close = CloseOnExit(gate);
    let mut next_id = BatchId::FIRST;

    tracing::debug!(
        sink = sink.name(),
        ?mode,
        threshold = gate.threshold(),
        "flusher started"
    );

    loop {
        let mut state = gate.lock();
        if !gate.wait_for_batch(&mut state) {
            break;
        }

        let id = next_id;
        next_id = next_id.next();

        let batch = state.take_batch();
        let len = batch.len();
        tracing::debug!(%id, bytes = len, "flushing batch");

        let result = match mode {
            FlushMode::Locked => sink.write_batch(id, batch),
            FlushMode::Swap => MutexGuard::unlocked(&mut state, || sink.write_batch(id, batch)),
        };

        match result {
            Ok(()) => gate.stats().record_flush(len),
            Err(e) => {
                tracing::error!(%id, bytes = len, sink = sink.name(), "flush batch error: {}", e);
                gate.stats().record_failure(len);
            }
        }
    }

    tracing::debug!(batches = next_id.as_u64() - 1, "flusher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::from_fn;
    use crate::writer::Writer;
    use crossbeam::channel;
    use flushgate_common::utils::error::{AppendError, SinkError};
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn start<S: Sink>(config: &GateConfig, sink: S) -> (Writer, Flusher) {
        let gate = Arc::new(BatchGate::new(config).unwrap());
        let flusher = Flusher::spawn(Arc::clone(&gate), sink, config).unwrap();
        (Writer::new(gate), flusher)
    }

    #[test]
    fn test_flushes_at_threshold() {
        let (tx, rx) = channel::unbounded();
        let (writer, flusher) = start(
            &GateConfig::new(8),
            from_fn(move |id, batch| {
                tx.send((id, batch)).unwrap();
                Ok(())
            }),
        );

        writer.append(b"abcd").unwrap();
        writer.append(b"efgh").unwrap();

        let (id, batch) = rx.recv_timeout(TIMEOUT).unwrap();
        assert_eq!(id, BatchId::FIRST);
        assert_eq!(&batch[..], b"abcdefgh");

        assert!(flusher.shutdown().unwrap().is_empty());
    }

    #[test]
    fn test_batch_ids_increase() {
        let (tx, rx) = channel::unbounded();
        let (writer, flusher) = start(
            &GateConfig::new(1),
            from_fn(move |id, _| {
                tx.send(id).unwrap();
                Ok(())
            }),
        );

        let mut ids = Vec::new();
        for _ in 0..3 {
            writer.append(b"x").unwrap();
            ids.push(rx.recv_timeout(TIMEOUT).unwrap());
        }
        flusher.shutdown().unwrap();

        assert_eq!(ids, vec![BatchId::new(1), BatchId::new(2), BatchId::new(3)]);
        assert_eq!(writer.stats().batches_flushed, 3);
    }

    #[test]
    fn test_sink_failure_drops_batch_and_continues() {
        let (tx, rx) = channel::unbounded();
        let mut calls = 0;
        let (writer, flusher) = start(
            &GateConfig::new(4),
            from_fn(move |id, batch: Bytes| {
                calls += 1;
                tx.send((id, batch.len())).unwrap();
                if calls == 1 {
                    return Err(SinkError::Other("disk full".to_string()));
                }
                Ok(())
            }),
        );

        writer.append(b"fail").unwrap();
        assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), (BatchId::new(1), 4));

        // The failed batch is gone; the next one starts from empty
        writer.append(b"okay").unwrap();
        assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), (BatchId::new(2), 4));

        assert!(flusher.shutdown().unwrap().is_empty());
        let stats = writer.stats();
        assert_eq!(stats.batches_failed, 1);
        assert_eq!(stats.bytes_dropped, 4);
        assert_eq!(stats.batches_flushed, 1);
        assert_eq!(stats.bytes_flushed, 4);
    }

    #[test]
    fn test_shutdown_returns_residual() {
        let (writer, flusher) = start(&GateConfig::new(100), from_fn(|_, _| Ok(())));
        writer.append(b"partial").unwrap();

        assert!(flusher.is_running());
        let residual = flusher.shutdown().unwrap();
        assert_eq!(&residual[..], b"partial");

        assert_eq!(writer.append(b"more"), Err(AppendError::Closed));
        assert_eq!(writer.stats().batches_flushed, 0);
    }

    #[test]
    fn test_drop_stops_thread() {
        let (writer, flusher) = start(&GateConfig::new(100), from_fn(|_, _| Ok(())));
        writer.append(b"lost").unwrap();
        drop(flusher);

        assert!(writer.is_closed());
        assert_eq!(writer.buffered_bytes(), 0);
    }

    #[test]
    fn test_panicking_sink() {
        let (writer, flusher) = start(
            &GateConfig::new(1),
            from_fn(|_, _| -> std::result::Result<(), SinkError> { panic!("sink exploded") }),
        );
        writer.append(b"boom").unwrap();

        // The loop closes the gate on its way out
        let deadline = std::time::Instant::now() + TIMEOUT;
        while !writer.is_closed() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(writer.is_closed());
        assert!(matches!(flusher.shutdown(), Err(Error::FlusherPanicked)));
    }

    #[test]
    fn test_spawn_uses_thread_name() {
        let (tx, rx) = channel::bounded(1);
        let config = GateConfig::new(1).with_thread_name("custom-flusher");
        let (writer, flusher) = start(
            &config,
            from_fn(move |_, _| {
                tx.send(thread::current().name().map(str::to_string)).unwrap();
                Ok(())
            }),
        );

        writer.append(b"x").unwrap();
        assert_eq!(
            rx.recv_timeout(TIMEOUT).unwrap().as_deref(),
            Some("custom-flusher")
        );
        assert_eq!(flusher.mode(), FlushMode::Locked);
        flusher.shutdown().unwrap();
    }
}
