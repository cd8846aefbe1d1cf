//! Producer-facing append API.

use std::sync::Arc;

use crate::gate::BatchGate;
use crate::stats::StatsSnapshot;
use flushgate_common::utils::error::AppendError;

/// Cloneable handle producers use to append events.
///
/// Every clone appends into the same gate. Appends never wait for space: if
/// the current batch is already at the flush threshold the call fails
/// immediately with [`AppendError::CapacityExceeded`].
#[derive(Debug, Clone)]
pub struct Writer {
    gate: Arc<BatchGate>,
}

impl Writer {
    /// Creates a writer for the given gate.
    #[must_use]
    pub fn new(gate: Arc<BatchGate>) -> Self {
        Self { gate }
    }

    /// Appends one event payload to the current batch.
    ///
    /// Admission is a pre-check only: the call succeeds whenever the buffer
    /// is below the threshold when the lock is acquired, even if this payload
    /// carries the batch past it.
    ///
    /// # Errors
    ///
    /// - [`AppendError::CapacityExceeded`] if the buffer is at or over the
    ///   threshold. Nothing is written. Retry later.
    /// - [`AppendError::Closed`] if the flusher has been shut down.
    ///
    /// # Examples
    ///
    /// ```
    /// use flushgate_core::sink::from_fn;
    /// use flushgate_core::{GateConfig, spawn};
    ///
    /// let (writer, flusher) = spawn(GateConfig::new(1024), from_fn(|_, _| Ok(()))).unwrap();
    /// writer.append(b"event").unwrap();
    /// let residual = flusher.shutdown().unwrap();
    /// assert_eq!(&residual[..], b"event");
    /// ```
    pub fn append(&self, payload: &[u8]) -> Result<(), AppendError> {
        let threshold = self.gate.threshold();
        let mut state = self.gate.lock();

        if state.is_closed() {
            return Err(AppendError::Closed);
        }

        let current_size = state.size();
        if current_size >= threshold {
            drop(state);
            self.gate.stats().record_reject();
            tracing::debug!(current_size, threshold, "append rejected: batch at flush threshold");
            return Err(AppendError::CapacityExceeded {
                current_size,
                threshold,
            });
        }

        state.append(payload);
        self.gate.stats().record_accept(payload.len());
        self.gate.signal();
        Ok(())
    }

    /// The configured flush threshold in bytes.
    #[must_use]
    pub fn threshold(&self) -> usize {
        self.gate.threshold()
    }

    /// Bytes in the current batch. Takes the gate's lock.
    #[must_use]
    pub fn buffered_bytes(&self) -> usize {
        self.gate.buffered_bytes()
    }

    /// Returns true once the flusher has been shut down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.gate.is_closed()
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.gate.stats().snapshot()
    }
}
