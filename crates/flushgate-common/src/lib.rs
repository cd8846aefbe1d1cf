//! # flushgate-common
//!
//! Foundation layer for Flushgate: the error taxonomy and identifier types
//! shared by the core, the adapters and the CLI.
//!
//! This crate has no internal dependencies and should be kept minimal.
//!
//! ## Modules
//!
//! - [`types`] - Identifier types ([`BatchId`])
//! - [`utils`] - Utilities (errors)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod types;
pub mod utils;

// Re-export commonly used types at crate root
pub use types::BatchId;
pub use utils::error::{AppendError, Error, Result, SinkError};
