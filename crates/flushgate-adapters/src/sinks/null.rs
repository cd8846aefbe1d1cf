//! Sink that discards everything.

use bytes::Bytes;
use flushgate_common::types::BatchId;
use flushgate_common::utils::error::SinkError;
use flushgate_core::Sink;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counts batches and bytes, keeps nothing.
///
/// Clones share the counters.
#[derive(Debug, Clone, Default)]
pub struct NullSink {
    batches: Arc<AtomicU64>,
    bytes: Arc<AtomicU64>,
}

impl NullSink {
    /// Creates a sink with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches discarded so far.
    #[must_use]
    pub fn batches(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }

    /// Bytes discarded so far.
    #[must_use]
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}

impl Sink for NullSink {
    fn write_batch(&mut self, _id: BatchId, batch: Bytes) -> Result<(), SinkError> {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(batch.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let counters = NullSink::new();
        let mut sink = counters.clone();
        sink.write_batch(BatchId::new(1), Bytes::from(vec![0u8; 10]))
            .unwrap();
        sink.write_batch(BatchId::new(2), Bytes::from(vec![0u8; 5]))
            .unwrap();

        assert_eq!(counters.batches(), 2);
        assert_eq!(counters.bytes(), 15);
    }
}
