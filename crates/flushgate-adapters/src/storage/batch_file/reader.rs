//! Batch file reader.

use super::frame::BatchFrame;
use byteorder::{LittleEndian, ReadBytesExt};
use bytes::Bytes;
use flushgate_common::types::BatchId;
use flushgate_common::utils::error::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

/// Reads the frames of a batch file.
pub struct BatchFileReader {
    /// Path to the batch file.
    path: PathBuf,
}

impl BatchFileReader {
    /// Creates a reader for the given batch file.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Reads every intact frame.
    ///
    /// Stops at the first torn or corrupt frame, logs it, and returns the
    /// frames before it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or an I/O error other
    /// than a short read occurs.
    pub fn read_all(&self) -> Result<Vec<BatchFrame>> {
        let (frames, damage) = self.scan()?;
        if let Some(e) = damage {
            tracing::warn!(path = %self.path.display(), "batch file corruption detected: {}", e);
        }
        Ok(frames)
    }

    /// Reads every frame, failing on the first damaged one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Corrupt`] for a torn or corrupt frame, or an I/O
    /// error.
    pub fn read_strict(&self) -> Result<Vec<BatchFrame>> {
        let (frames, damage) = self.scan()?;
        match damage {
            Some(e) => Err(e),
            None => Ok(frames),
        }
    }

    fn scan(&self) -> Result<(Vec<BatchFrame>, Option<Error>)> {
        let file = File::open(&self.path)?;
        let mut reader = BufReader::new(file);
        let mut frames = Vec::new();
        let mut offset = 0u64;

        loop {
            match Self::read_frame(&mut reader, offset) {
                Ok(Some(frame)) => {
                    offset += frame.encoded_len() as u64;
                    frames.push(frame);
                }
                Ok(None) => return Ok((frames, None)),
                Err(e @ Error::Corrupt { .. }) => return Ok((frames, Some(e))),
                Err(e) => return Err(e),
            }
        }
    }

    fn read_frame(reader: &mut BufReader<File>, offset: u64) -> Result<Option<BatchFrame>> {
        // A clean EOF is only valid on a frame boundary
        if reader.fill_buf()?.is_empty() {
            return Ok(None);
        }

        let torn = |what: &str| Error::Corrupt {
            offset,
            reason: format!("truncated {what}"),
        };

        let id = read_or(reader.read_u64::<LittleEndian>(), || torn("header"))?;
        let len = read_or(reader.read_u32::<LittleEndian>(), || torn("header"))? as usize;

        // Grow as bytes arrive so a damaged length cannot force a huge allocation
        let mut payload = Vec::new();
        if reader.by_ref().take(len as u64).read_to_end(&mut payload)? < len {
            return Err(torn("payload"));
        }

        let stored = read_or(reader.read_u32::<LittleEndian>(), || torn("checksum"))?;
        let actual = crc32fast::hash(&payload);
        if stored != actual {
            return Err(Error::Corrupt {
                offset,
                reason: format!("checksum mismatch: stored {stored:#010x}, computed {actual:#010x}"),
            });
        }

        let id = BatchId::new(id);
        if !id.is_valid() {
            return Err(Error::Corrupt {
                offset,
                reason: "invalid batch id 0".to_string(),
            });
        }

        Ok(Some(BatchFrame {
            id,
            offset,
            payload: Bytes::from(payload),
        }))
    }
}

/// Maps a short read to `torn()`, passes other I/O errors through.
fn read_or<T>(result: std::io::Result<T>, torn: impl FnOnce() -> Error) -> Result<T> {
    match result {
        Ok(v) => Ok(v),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(torn()),
        Err(e) => Err(e.into()),
    }
}
