//! # flushgate-adapters
//!
//! Concrete sinks for the Flushgate flusher and the on-disk batch file.
//!
//! ## Modules
//!
//! - [`sinks`] - In-process sinks (memory, channel, null)
//! - [`storage`] - Storage backends (framed batch file and its reader)

pub mod sinks;
pub mod storage;
