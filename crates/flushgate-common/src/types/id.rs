//! Identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequence number of a flushed batch.
///
/// The flusher numbers batches from 1 upward in the order they are handed to
/// the sink. `BatchId(0)` is never assigned and is used as a sentinel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct BatchId(pub u64);

impl BatchId {
    /// The sentinel id, never assigned to a real batch.
    pub const INVALID: Self = Self(0);

    /// The id assigned to the first batch.
    pub const FIRST: Self = Self(1);

    /// Creates a new batch id from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns true unless this is the sentinel id.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// Returns the id that follows this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch#{}", self.0)
    }
}

impl From<u64> for BatchId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_id_sequence() {
        let id = BatchId::FIRST;
        assert!(id.is_valid());
        assert!(!BatchId::INVALID.is_valid());
        assert_eq!(id.next(), BatchId::new(2));
        assert!(id < id.next());
    }

    #[test]
    fn test_batch_id_display() {
        assert_eq!(BatchId::new(42).to_string(), "batch#42");
        assert_eq!(BatchId::from(7).as_u64(), 7);
    }
}
