//! Frame layout shared by the batch file writer and reader.

use byteorder::{LittleEndian, WriteBytesExt};
use bytes::Bytes;
use flushgate_common::types::BatchId;
use serde::Serialize;
use std::io::{self, Write};

/// Bytes before the payload: batch id and length.
pub(crate) const HEADER_LEN: usize = 8 + 4;

/// Bytes after the payload: checksum.
pub(crate) const TRAILER_LEN: usize = 4;

/// Per-frame overhead on top of the payload.
pub const FRAME_OVERHEAD: usize = HEADER_LEN + TRAILER_LEN;

/// Largest payload a frame can carry.
pub const MAX_PAYLOAD_LEN: usize = u32::MAX as usize;

/// One batch read back from a batch file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFrame {
    /// Batch number assigned by the flusher.
    pub id: BatchId,
    /// Byte offset of the frame in the file.
    pub offset: u64,
    /// The batch bytes.
    #[serde(skip)]
    pub payload: Bytes,
}

impl BatchFrame {
    /// Payload length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Returns true for an empty payload.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Size of the frame on disk.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        self.payload.len() + FRAME_OVERHEAD
    }
}

/// Writes one frame. The caller has checked the payload length.
pub(crate) fn write_frame<W: Write>(w: &mut W, id: BatchId, payload: &[u8]) -> io::Result<()> {
    debug_assert!(payload.len() <= MAX_PAYLOAD_LEN);
    w.write_u64::<LittleEndian>(id.as_u64())?;
    w.write_u32::<LittleEndian>(payload.len() as u32)?;
    w.write_all(payload)?;
    w.write_u32::<LittleEndian>(crc32fast::hash(payload))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_layout() {
        let mut out = Vec::new();
        write_frame(&mut out, BatchId::new(3), b"abc").unwrap();

        assert_eq!(out.len(), 3 + FRAME_OVERHEAD);
        assert_eq!(&out[..8], &3u64.to_le_bytes());
        assert_eq!(&out[8..12], &3u32.to_le_bytes());
        assert_eq!(&out[12..15], b"abc");
        assert_eq!(&out[15..], &crc32fast::hash(b"abc").to_le_bytes());
    }
}
