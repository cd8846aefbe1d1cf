//! Gate configuration.

use flushgate_common::utils::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default flusher thread name.
pub const DEFAULT_THREAD_NAME: &str = "flushgate-flusher";

/// Upper bound on the buffer's initial allocation.
const MAX_INITIAL_CAPACITY: usize = 1024 * 1024;

/// How the flusher treats the gate's lock while the sink runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushMode {
    /// Hold the lock across the sink call. No append can land mid-flush and
    /// producers wait for the sink to finish.
    #[default]
    Locked,
    /// Take the batch under the lock, then release it for the sink call so
    /// producers can start the next batch while this one is written.
    Swap,
}

/// Configuration for a batch gate and its flusher.
///
/// Deserializing fills omitted fields the same way [`GateConfig::new`] does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "GateConfigFields")]
pub struct GateConfig {
    /// Byte count at or above which a batch is flushed.
    pub flush_threshold: usize,
    /// Lock behavior during flush.
    pub flush_mode: FlushMode,
    /// Bytes pre-allocated for the buffer, at most 1 MiB.
    pub initial_capacity: usize,
    /// Name given to the flusher thread.
    pub thread_name: String,
}

/// Serialized form of [`GateConfig`]; only the threshold is required.
#[derive(Deserialize)]
struct GateConfigFields {
    flush_threshold: usize,
    #[serde(default)]
    flush_mode: FlushMode,
    initial_capacity: Option<usize>,
    thread_name: Option<String>,
}

impl From<GateConfigFields> for GateConfig {
    fn from(fields: GateConfigFields) -> Self {
        let mut config = Self::new(fields.flush_threshold).with_flush_mode(fields.flush_mode);
        if let Some(capacity) = fields.initial_capacity {
            config.initial_capacity = capacity;
        }
        if let Some(name) = fields.thread_name {
            config.thread_name = name;
        }
        config
    }
}

impl GateConfig {
    /// Creates a configuration with the given flush threshold and defaults
    /// for everything else.
    ///
    /// # Examples
    ///
    /// ```
    /// use flushgate_core::{FlushMode, GateConfig};
    ///
    /// let config = GateConfig::new(1024 * 1024).with_flush_mode(FlushMode::Swap);
    /// assert!(config.validate().is_ok());
    /// ```
    #[must_use]
    pub fn new(flush_threshold: usize) -> Self {
        Self {
            flush_threshold,
            flush_mode: FlushMode::default(),
            initial_capacity: flush_threshold.min(MAX_INITIAL_CAPACITY),
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }

    /// Sets the flush mode.
    #[must_use]
    pub fn with_flush_mode(mut self, mode: FlushMode) -> Self {
        self.flush_mode = mode;
        self
    }

    /// Sets the buffer's initial allocation.
    #[must_use]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Sets the flusher thread name.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the threshold is zero, the initial
    /// capacity is above 1 MiB, or the thread name is empty.
    pub fn validate(&self) -> Result<()> {
        if self.flush_threshold == 0 {
            return Err(Error::InvalidConfig(
                "flush_threshold must be positive".to_string(),
            ));
        }
        if self.initial_capacity > MAX_INITIAL_CAPACITY {
            return Err(Error::InvalidConfig(format!(
                "initial_capacity {} exceeds the {} byte limit",
                self.initial_capacity, MAX_INITIAL_CAPACITY
            )));
        }
        if self.thread_name.is_empty() {
            return Err(Error::InvalidConfig(
                "thread_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GateConfig {
    /// One megabyte batches.
    fn default() -> Self {
        Self::new(1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GateConfig::default();
        assert_eq!(config.flush_threshold, 1024 * 1024);
        assert_eq!(config.flush_mode, FlushMode::Locked);
        assert_eq!(config.thread_name, DEFAULT_THREAD_NAME);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_initial_capacity_is_clamped() {
        assert_eq!(GateConfig::new(999).initial_capacity, 999);
        assert_eq!(
            GateConfig::new(64 * 1024 * 1024).initial_capacity,
            MAX_INITIAL_CAPACITY
        );
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let err = GateConfig::new(0).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_validate_rejects_oversized_capacity() {
        let config = GateConfig::new(8).with_initial_capacity(usize::MAX);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = GateConfig::new(8).with_initial_capacity(MAX_INITIAL_CAPACITY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: GateConfig = serde_json::from_str(r#"{"flush_threshold":1024}"#).unwrap();
        assert_eq!(config, GateConfig::new(1024));

        let config: GateConfig = serde_json::from_str(
            r#"{"flush_threshold":64,"flush_mode":"swap","thread_name":"ingest"}"#,
        )
        .unwrap();
        assert_eq!(config.flush_mode, FlushMode::Swap);
        assert_eq!(config.initial_capacity, 64);
        assert_eq!(config.thread_name, "ingest");
    }

    #[test]
    fn test_serialized_config_reads_back() {
        let config = GateConfig::new(4096)
            .with_flush_mode(FlushMode::Swap)
            .with_initial_capacity(512);
        let json = serde_json::to_string(&config).unwrap();
        let back: GateConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_validate_rejects_empty_thread_name() {
        let config = GateConfig::new(10).with_thread_name("");
        assert!(config.validate().is_err());
    }
}
