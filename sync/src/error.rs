//! Unified error handling for the sync layer.

use std::path::PathBuf;

/// Sync error type.
///
/// Adapter errors are fatal for the adapter call that raised them. Nothing in
/// this crate retries; a caller may retry a read or write with the same
/// cursor.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    #[error("File error on {}: {source}", path.display())]
    FileError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Incorrect source: {0}")]
    IncorrectSource(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Engine error: {0}")]
    Engine(#[from] tablesync_engine::Error),

    #[error("TSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl SyncError {
    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::FileError {
            path: path.into(),
            source,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid SYNC_MERGE_MODE value: {0}")]
    InvalidMergeMode(String),

    #[error("Invalid SYNC_BATCH_SIZE value: {0}")]
    InvalidBatchSize(String),
}

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
