//! Batch file writer.

use super::frame::{MAX_PAYLOAD_LEN, write_frame};
use bytes::Bytes;
use flushgate_common::types::BatchId;
use flushgate_common::utils::error::{Result, SinkError};
use flushgate_core::Sink;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// When written frames are pushed to the OS and to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Hand every frame to the OS; rely on it for durability.
    #[default]
    Flush,
    /// Also fsync after every frame.
    Sync,
}

/// Configuration for a [`BatchFileSink`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchFileConfig {
    /// Sync behavior after each frame.
    pub sync_mode: SyncMode,
    /// Truncate an existing file instead of appending to it.
    pub truncate: bool,
}

/// Sink that appends each batch as a frame to a file.
///
/// A frame is either written whole or not at all: if any part of a write
/// fails, the file is cut back to the end of the last complete frame, so a
/// batch reported as failed never shows up in the file later.
pub struct BatchFileSink {
    /// Path to the batch file.
    path: PathBuf,
    /// The open file.
    file: File,
    /// Encoding buffer for the frame being written.
    frame: Vec<u8>,
    /// File length up to the end of the last complete frame.
    valid_len: u64,
    /// Configuration.
    config: BatchFileConfig,
    /// Frames written by this handle.
    frames_written: u64,
    /// Bytes written by this handle, framing included.
    bytes_written: u64,
    /// Fail the next write after this many bytes reach the file.
    #[cfg(test)]
    fail_after: Option<usize>,
}

impl BatchFileSink {
    /// Opens or creates a batch file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: impl AsRef<Path>, config: BatchFileConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut options = OpenOptions::new();
        options.create(true);
        if config.truncate {
            options.write(true).truncate(true);
        } else {
            options.append(true);
        }
        let file = options.open(&path)?;
        let valid_len = file.metadata()?.len();

        tracing::debug!(
            path = %path.display(),
            sync_mode = ?config.sync_mode,
            valid_len,
            "opened batch file"
        );

        Ok(Self {
            path,
            file,
            frame: Vec::new(),
            valid_len,
            config,
            frames_written: 0,
            bytes_written: 0,
            #[cfg(test)]
            fail_after: None,
        })
    }

    /// Returns the path to the batch file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Frames written through this handle.
    #[must_use]
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Bytes written through this handle, framing included.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn append(&mut self, id: BatchId, payload: &[u8]) -> std::result::Result<(), SinkError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(SinkError::TooLarge {
                len: payload.len(),
                max: MAX_PAYLOAD_LEN,
            });
        }

        self.frame.clear();
        write_frame(&mut self.frame, id, payload)?;

        if let Err(e) = self.write_frame_out() {
            self.discard_partial_frame();
            return Err(e.into());
        }

        let len = self.frame.len() as u64;
        self.valid_len += len;
        self.frames_written += 1;
        self.bytes_written += len;
        Ok(())
    }

    fn write_frame_out(&mut self) -> io::Result<()> {
        self.injected_failure()?;
        self.file.write_all(&self.frame)?;
        if self.config.sync_mode == SyncMode::Sync {
            self.file.sync_all()?;
        }
        Ok(())
    }

    #[cfg(test)]
    fn injected_failure(&mut self) -> io::Result<()> {
        match self.fail_after.take() {
            Some(n) => {
                self.file.write_all(&self.frame[..n.min(self.frame.len())])?;
                Err(io::Error::other("injected write failure"))
            }
            None => Ok(()),
        }
    }

    #[cfg(not(test))]
    #[inline]
    #[allow(clippy::unused_self, clippy::unnecessary_wraps)]
    fn injected_failure(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Cuts the file back to the last complete frame.
    fn discard_partial_frame(&mut self) {
        let result = self
            .file
            .set_len(self.valid_len)
            .and_then(|()| self.file.seek(SeekFrom::Start(self.valid_len)));
        if let Err(e) = result {
            tracing::error!(
                path = %self.path.display(),
                offset = self.valid_len,
                "failed to discard partial frame: {}",
                e
            );
        }
    }
}

impl Sink for BatchFileSink {
    fn write_batch(&mut self, id: BatchId, batch: Bytes) -> std::result::Result<(), SinkError> {
        self.append(id, &batch)
    }

    fn name(&self) -> &'static str {
        "batch-file"
    }
}

impl std::fmt::Debug for BatchFileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchFileSink")
            .field("path", &self.path)
            .field("config", &self.config)
            .field("valid_len", &self.valid_len)
            .field("frames_written", &self.frames_written)
            .finish_non_exhaustive()
    }
}
