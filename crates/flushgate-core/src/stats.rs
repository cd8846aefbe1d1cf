//! Counters shared by writers and the flusher.
//!
//! These are advisory. They are updated with relaxed atomics outside any
//! ordering guarantee of the gate's lock, so a snapshot taken while producers
//! are active may be momentarily inconsistent across fields.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters for one gate.
#[derive(Debug, Default)]
pub struct GateStats {
    events_accepted: AtomicU64,
    bytes_accepted: AtomicU64,
    appends_rejected: AtomicU64,
    batches_flushed: AtomicU64,
    bytes_flushed: AtomicU64,
    batches_failed: AtomicU64,
    bytes_dropped: AtomicU64,
}

impl GateStats {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_accept(&self, bytes: usize) {
        self.events_accepted.fetch_add(1, Ordering::Relaxed);
        self.bytes_accepted.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_reject(&self) {
        self.appends_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_flush(&self, bytes: usize) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
        self.bytes_flushed.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self, bytes: usize) {
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
        self.bytes_dropped.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Copies the current counter values.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            events_accepted: self.events_accepted.load(Ordering::Relaxed),
            bytes_accepted: self.bytes_accepted.load(Ordering::Relaxed),
            appends_rejected: self.appends_rejected.load(Ordering::Relaxed),
            batches_flushed: self.batches_flushed.load(Ordering::Relaxed),
            bytes_flushed: self.bytes_flushed.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            bytes_dropped: self.bytes_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`GateStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Appends admitted into the buffer.
    pub events_accepted: u64,
    /// Payload bytes admitted into the buffer.
    pub bytes_accepted: u64,
    /// Appends rejected with `CapacityExceeded`.
    pub appends_rejected: u64,
    /// Batches the sink accepted.
    pub batches_flushed: u64,
    /// Bytes the sink accepted.
    pub bytes_flushed: u64,
    /// Batches the sink failed on.
    pub batches_failed: u64,
    /// Bytes discarded because their batch failed.
    pub bytes_dropped: u64,
}

impl StatsSnapshot {
    /// Bytes admitted but neither flushed nor dropped (still buffered, or
    /// returned as residual at shutdown).
    #[must_use]
    pub fn bytes_pending(&self) -> u64 {
        self.bytes_accepted
            .saturating_sub(self.bytes_flushed + self.bytes_dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_counts() {
        let stats = GateStats::new();
        stats.record_accept(50);
        stats.record_accept(50);
        stats.record_reject();
        stats.record_flush(60);
        stats.record_failure(30);

        let snap = stats.snapshot();
        assert_eq!(snap.events_accepted, 2);
        assert_eq!(snap.bytes_accepted, 100);
        assert_eq!(snap.appends_rejected, 1);
        assert_eq!(snap.batches_flushed, 1);
        assert_eq!(snap.batches_failed, 1);
        assert_eq!(snap.bytes_pending(), 10);
    }
}
