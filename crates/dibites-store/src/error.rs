//! Error types for the storage layer.
//!
//! All errors are propagated via [`StoreError`], which wraps the underlying
//! I/O, Arrow, and Parquet errors together with the file involved.

use std::path::PathBuf;

/// Errors that can occur while loading or writing tables and the ledger.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A Parquet file could not be read or written.
    #[error("Parquet error on {path}: {source}")]
    Parquet {
        /// Table file involved.
        path: PathBuf,
        /// The underlying Parquet error.
        source: parquet::errors::ParquetError,
    },

    /// An Arrow batch could not be assembled or decoded.
    #[error("Arrow error on {path}: {source}")]
    Arrow {
        /// Table file involved.
        path: PathBuf,
        /// The underlying Arrow error.
        source: arrow::error::ArrowError,
    },

    /// A table file does not have the expected columns.
    #[error("unexpected schema in {path}: {detail}")]
    Schema {
        /// Table file involved.
        path: PathBuf,
        /// Which column was wrong.
        detail: String,
    },

    /// A JSON column held text that does not parse.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        /// Table file involved.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
