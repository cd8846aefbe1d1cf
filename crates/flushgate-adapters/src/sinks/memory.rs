//! Sink that keeps batches in memory.

use bytes::Bytes;
use flushgate_common::types::BatchId;
use flushgate_common::utils::error::SinkError;
use flushgate_core::Sink;
use parking_lot::Mutex;
use std::sync::Arc;

/// Collects every flushed batch.
///
/// Clones share storage, so keep one clone to inspect what the flusher wrote
/// and hand the other to it.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    batches: Arc<Mutex<Vec<(BatchId, Bytes)>>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies out the batches received so far, in flush order.
    #[must_use]
    pub fn batches(&self) -> Vec<(BatchId, Bytes)> {
        self.batches.lock().clone()
    }

    /// Number of batches received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.batches.lock().len()
    }

    /// Returns true if nothing has been received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batches.lock().is_empty()
    }

    /// Total bytes across all batches.
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.batches.lock().iter().map(|(_, b)| b.len()).sum()
    }

    /// Concatenation of every batch, in flush order.
    #[must_use]
    pub fn concat(&self) -> Vec<u8> {
        let batches = self.batches.lock();
        let mut out = Vec::with_capacity(batches.iter().map(|(_, b)| b.len()).sum());
        for (_, batch) in batches.iter() {
            out.extend_from_slice(batch);
        }
        out
    }
}

impl Sink for MemorySink {
    fn write_batch(&mut self, id: BatchId, batch: Bytes) -> Result<(), SinkError> {
        self.batches.lock().push((id, batch));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
