//! Error types for Flushgate.
//!
//! Three layers of failure exist and they never mix:
//!
//! - [`AppendError`] is returned synchronously to producers.
//! - [`SinkError`] is produced by a sink during a flush and stays inside the
//!   flush loop (logged, batch dropped, loop continues).
//! - [`Error`] covers construction, lifecycle and adapter failures.

use thiserror::Error;

/// Result type alias for Flushgate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned to a producer calling `Writer::append`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppendError {
    /// The batch is already at or over the flush threshold and the flusher
    /// has not drained it yet. Retry later.
    #[error(
        "current batch size ({current_size}) is at or over the flush threshold ({threshold}); cannot add more events"
    )]
    CapacityExceeded {
        /// Bytes buffered when the append was rejected.
        current_size: usize,
        /// Configured flush threshold.
        threshold: usize,
    },
    /// The flusher has been shut down; no more data is accepted.
    #[error("batch gate is closed")]
    Closed,
}

impl AppendError {
    /// Returns true if retrying the same append later can succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CapacityExceeded { .. })
    }
}

/// Errors produced by a sink while accepting a batch.
#[derive(Error, Debug)]
pub enum SinkError {
    /// I/O failure in the sink's transport.
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The downstream receiver is gone.
    #[error("sink receiver disconnected")]
    Disconnected,
    /// The batch cannot be represented by the sink's format.
    #[error("batch of {len} bytes exceeds sink limit of {max} bytes")]
    TooLarge {
        /// Batch length.
        len: usize,
        /// Largest batch the sink accepts.
        max: usize,
    },
    /// Any other sink-specific failure.
    #[error("{0}")]
    Other(String),
}

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration rejected by validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Append rejected.
    #[error(transparent)]
    Append(#[from] AppendError),

    /// Sink failure surfaced outside the flush loop.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// A batch file frame failed validation.
    #[error("corrupt batch frame at offset {offset}: {reason}")]
    Corrupt {
        /// Byte offset of the frame start.
        offset: u64,
        /// What was wrong with it.
        reason: String,
    },

    /// The flusher thread could not be started.
    #[error("failed to spawn flusher thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The flusher thread panicked (usually inside the sink).
    #[error("flusher thread panicked")]
    FlusherPanicked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_exceeded_is_retryable() {
        let err = AppendError::CapacityExceeded {
            current_size: 1000,
            threshold: 999,
        };
        assert!(err.is_retryable());
        assert!(!AppendError::Closed.is_retryable());
        assert!(err.to_string().contains("(1000)"));
    }

    #[test]
    fn test_error_conversions() {
        let err: Error = AppendError::Closed.into();
        assert!(matches!(err, Error::Append(AppendError::Closed)));

        let err: Error = SinkError::Disconnected.into();
        assert_eq!(err.to_string(), "sink receiver disconnected");

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
