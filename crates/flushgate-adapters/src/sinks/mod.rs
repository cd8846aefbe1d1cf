//! In-process sinks.
//!
//! - [`MemorySink`] - Keeps every batch in a shared vector
//! - [`ChannelSink`] - Forwards batches to a crossbeam channel
//! - [`NullSink`] - Counts and discards

mod channel;
mod memory;
mod null;

pub use channel::ChannelSink;
pub use memory::MemorySink;
pub use null::NullSink;
