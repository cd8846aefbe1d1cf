//! The batch gate: one mutex, one condition variable, one predicate.
//!
//! Everything the writers and the flusher share lives in [`GateState`] behind
//! the gate's mutex, so the buffer can only be touched with the lock held.
//! The predicate "batch ready" is `size >= flush_threshold`; it is only ever
//! evaluated on a locked state.

use bytes::Bytes;
use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::buffer::Buffer;
use crate::config::GateConfig;
use crate::stats::GateStats;
use flushgate_common::utils::error::Result;

/// State guarded by the gate's lock.
#[derive(Debug)]
pub struct GateState {
    buffer: Buffer,
    closed: bool,
}

impl GateState {
    /// Bytes currently buffered.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.buffer.size()
    }

    /// Returns true once the gate has been closed.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn append(&mut self, payload: &[u8]) {
        self.buffer.append(payload);
    }

    pub(crate) fn take_batch(&mut self) -> Bytes {
        self.buffer.take()
    }
}

/// Mutex + condition variable coordinating writers and the flusher.
#[derive(Debug)]
pub struct BatchGate {
    state: Mutex<GateState>,
    ready: Condvar,
    flush_threshold: usize,
    stats: GateStats,
}

impl BatchGate {
    /// Creates an open gate with an empty buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn new(config: &GateConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: Mutex::new(GateState {
                buffer: Buffer::with_capacity(config.initial_capacity),
                closed: false,
            }),
            ready: Condvar::new(),
            flush_threshold: config.flush_threshold,
            stats: GateStats::new(),
        })
    }

    /// The configured flush threshold in bytes.
    #[inline]
    #[must_use]
    pub fn threshold(&self) -> usize {
        self.flush_threshold
    }

    /// Counters for this gate.
    #[must_use]
    pub fn stats(&self) -> &GateStats {
        &self.stats
    }

    /// Bytes currently buffered. Takes the lock.
    #[must_use]
    pub fn buffered_bytes(&self) -> usize {
        self.state.lock().size()
    }

    /// Returns true once the gate has been closed. Takes the lock.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().is_closed()
    }

    /// Acquires the gate's lock.
    pub(crate) fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock()
    }

    /// The "batch ready" predicate.
    #[inline]
    pub(crate) fn is_ready(&self, state: &GateState) -> bool {
        state.size() >= self.flush_threshold
    }

    /// Wakes the flusher. Called by writers with the lock held.
    #[inline]
    pub(crate) fn signal(&self) {
        self.ready.notify_one();
    }

    /// Suspends on the ready condition until a batch is due or the gate is
    /// closed.
    ///
    /// Returns true when a batch is due. A due batch wins over a close, so
    /// a full batch pending at shutdown still reaches the sink. The predicate
    /// is re-checked after every wake.
    pub(crate) fn wait_for_batch(&self, state: &mut MutexGuard<'_, GateState>) -> bool {
        while !self.is_ready(state) {
            if state.closed {
                return false;
            }
            self.ready.wait(state);
        }
        true
    }

    /// Closes the gate and wakes every waiter.
    ///
    /// Idempotent. After this, appends fail with `Closed` and the flusher
    /// leaves its loop once no full batch remains.
    pub(crate) fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.ready.notify_all();
    }

    /// Removes and returns whatever is still buffered.
    pub(crate) fn take_residual(&self) -> Bytes {
        self.state.lock().take_batch()
    }
}
