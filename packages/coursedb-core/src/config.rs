//! Database configuration.

use std::path::PathBuf;

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Request body read timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Snapshot directory; `None` keeps the store purely in memory
    pub data_dir: Option<PathBuf>,
    /// Save a snapshot after every successful mutation
    pub persist_on_write: bool,
    /// Maximum retry attempts for transient I/O errors
    pub persistence_max_retries: u32,
    /// Delay between retry attempts in milliseconds
    pub persistence_retry_delay_ms: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 5000, // 5 seconds default
            data_dir: None,
            persist_on_write: true,
            persistence_max_retries: 3,
            persistence_retry_delay_ms: 100,
        }
    }
}

impl DbConfig {
    /// Returns true if mutations should be written through to a snapshot.
    pub fn persistence_enabled(&self) -> bool {
        self.persist_on_write && self.data_dir.is_some()
    }
}
