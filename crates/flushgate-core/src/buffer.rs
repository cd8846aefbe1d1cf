//! The byte accumulator behind the gate.

use bytes::{Bytes, BytesMut};

/// Accumulated batch bytes plus a running byte count.
///
/// Not synchronized on its own; the gate owns it inside its mutex.
#[derive(Debug, Default)]
pub struct Buffer {
    data: BytesMut,
    size: usize,
}

impl Buffer {
    /// Creates an empty buffer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
            size: 0,
        }
    }

    /// Appends a payload.
    pub fn append(&mut self, payload: &[u8]) {
        self.data.extend_from_slice(payload);
        self.size += payload.len();
        self.check_invariant();
    }

    /// Hands off everything buffered and leaves the buffer empty.
    ///
    /// The returned bytes are frozen, so the receiver never observes later
    /// appends.
    pub fn take(&mut self) -> Bytes {
        let batch = self.data.split().freeze();
        self.size = 0;
        self.check_invariant();
        batch
    }

    /// Bytes currently buffered.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns true if nothing is buffered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Read-only view of the buffered bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    fn check_invariant(&self) {
        debug_assert_eq!(self.size, self.data.len(), "buffer size out of sync");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_tracks_size() {
        let mut buf = Buffer::with_capacity(16);
        assert!(buf.is_empty());

        buf.append(b"hello");
        buf.append(b" world");
        assert_eq!(buf.size(), 11);
        assert_eq!(buf.as_slice(), b"hello world");
    }

    #[test]
    fn test_empty_payload() {
        let mut buf = Buffer::default();
        buf.append(b"");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_take_resets() {
        let mut buf = Buffer::with_capacity(8);
        buf.append(b"abc");

        let batch = buf.take();
        assert_eq!(&batch[..], b"abc");
        assert_eq!(buf.size(), 0);
        assert!(buf.as_slice().is_empty());

        // The handed-off batch is unaffected by later appends
        buf.append(b"xyz");
        assert_eq!(&batch[..], b"abc");
        assert_eq!(buf.as_slice(), b"xyz");
    }
}
