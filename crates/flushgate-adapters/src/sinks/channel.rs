//! Sink that forwards batches over a channel.

use bytes::Bytes;
use crossbeam::channel::{self, Receiver, Sender};
use flushgate_common::types::BatchId;
use flushgate_common::utils::error::SinkError;
use flushgate_core::Sink;

/// Sends each batch to a [`Receiver`].
///
/// With a bounded channel a full queue blocks the flusher, and in
/// [`FlushMode::Locked`](flushgate_core::FlushMode::Locked) the producers with
/// it. Once the receiver is dropped every batch fails with
/// [`SinkError::Disconnected`].
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<(BatchId, Bytes)>,
}

impl ChannelSink {
    /// Wraps an existing sender.
    #[must_use]
    pub fn new(tx: Sender<(BatchId, Bytes)>) -> Self {
        Self { tx }
    }

    /// Creates a sink over an unbounded channel.
    #[must_use]
    pub fn unbounded() -> (Self, Receiver<(BatchId, Bytes)>) {
        let (tx, rx) = channel::unbounded();
        (Self { tx }, rx)
    }

    /// Creates a sink over a channel holding at most `cap` batches.
    #[must_use]
    pub fn bounded(cap: usize) -> (Self, Receiver<(BatchId, Bytes)>) {
        let (tx, rx) = channel::bounded(cap);
        (Self { tx }, rx)
    }
}

impl Sink for ChannelSink {
    fn write_batch(&mut self, id: BatchId, batch: Bytes) -> Result<(), SinkError> {
        self.tx
            .send((id, batch))
            .map_err(|_| SinkError::Disconnected)
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}
