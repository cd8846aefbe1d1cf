//! Core type definitions for Flushgate.

mod id;

pub use id::BatchId;
