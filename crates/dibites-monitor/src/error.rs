//! Error types for the monitor binary.
//!
//! [`MonitorError`] wraps every failure that can stop startup or abort a
//! whole pass. Per-archive problems never surface here; the poller logs
//! them and moves on.

use std::path::PathBuf;

use crate::config::ConfigError;

/// Top-level error for the monitor binary.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The ledger could not be loaded or persisted.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: dibites_store::StoreError,
    },

    /// The watched folder could not be listed.
    #[error("failed to list {path}: {source}")]
    Discovery {
        /// The watched folder.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A pass panicked or was cancelled on the blocking pool.
    #[error("pass task failed: {source}")]
    Task {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },
}
