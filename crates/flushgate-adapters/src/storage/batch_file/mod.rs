//! Append-only batch file.
//!
//! Each flushed batch becomes one frame:
//!
//! ```text
//! ┌──────────────┬──────────────┬───────────────┬──────────────┐
//! │ batch id u64 │ length u32   │ payload       │ crc32 u32    │
//! │ little-endian│ little-endian│ `length` bytes│ of payload   │
//! └──────────────┴──────────────┴───────────────┴──────────────┘
//! ```
//!
//! - [`BatchFileSink`] - Writes frames, one per batch
//! - [`BatchFileReader`] - Reads frames back, stopping at the first damaged one
//!
//! There is no crash durability: a crash mid-frame leaves a torn tail, which
//! the reader reports and skips.

mod frame;
mod reader;
mod sink;

pub use frame::{BatchFrame, FRAME_OVERHEAD, MAX_PAYLOAD_LEN};
pub use reader::BatchFileReader;
pub use sink::{BatchFileConfig, BatchFileSink, SyncMode};
