//! The flush destination.

use bytes::Bytes;
use flushgate_common::types::BatchId;
use flushgate_common::utils::error::SinkError;

/// Consumer of completed batches.
///
/// The flusher owns its sink and calls it from the flusher thread only, one
/// batch at a time. In [`FlushMode::Locked`](crate::FlushMode::Locked) the
/// gate's lock is held for the duration of the call, so a slow sink stalls
/// producers, and a sink that appends through a `Writer` of the same gate
/// deadlocks.
///
/// A returned error drops the batch. The flusher logs it and moves on; it
/// never retries.
pub trait Sink: Send + 'static {
    /// Accepts one batch.
    fn write_batch(&mut self, id: BatchId, batch: Bytes) -> Result<(), SinkError>;

    /// Short name used in log output.
    fn name(&self) -> &'static str {
        "sink"
    }
}

/// A sink backed by a closure. Built with [`from_fn`].
pub struct FnSink<F> {
    f: F,
}

impl<F> Sink for FnSink<F>
where
    F: FnMut(BatchId, Bytes) -> Result<(), SinkError> + Send + 'static,
{
    fn write_batch(&mut self, id: BatchId, batch: Bytes) -> Result<(), SinkError> {
        (self.f)(id, batch)
    }

    fn name(&self) -> &'static str {
        "fn"
    }
}

/// Wraps a closure as a [`Sink`].
///
/// # Examples
///
/// ```
/// use flushgate_core::sink::{Sink, from_fn};
/// use flushgate_core::BatchId;
///
/// let mut total = 0;
/// let mut sink = from_fn(move |_id, batch| {
///     total += batch.len();
///     Ok(())
/// });
/// sink.write_batch(BatchId::FIRST, "abc".into()).unwrap();
/// ```
pub fn from_fn<F>(f: F) -> FnSink<F>
where
    F: FnMut(BatchId, Bytes) -> Result<(), SinkError> + Send + 'static,
{
    FnSink { f }
}
