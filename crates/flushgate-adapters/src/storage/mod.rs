//! Storage backends.

pub mod batch_file;
