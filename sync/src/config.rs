//! Configuration management for the sync driver.

use crate::{error::ConfigError, MergeMode};
use std::env;
use std::path::Path;
use tablesync_engine::Format;
use tracing_subscriber::EnvFilter;

/// Default page size for cursor reads and writes.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Log directives used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "tablesync=info,tablesync_engine=info";

/// Load a `.env` file into the environment, then build the log filter.
///
/// `path` names the file; `None` searches the working directory and its
/// parents. Variables already set are not overridden.
pub fn load_env(path: Option<&Path>) -> EnvFilter {
    let _ = match path {
        Some(path) => dotenvy::from_path(path),
        None => dotenvy::dotenv().map(|_| ()),
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into())
}

/// Sync configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// How the two tables are combined
    pub merge_mode: MergeMode,
    /// Key column of the left table (first column when unset)
    pub left_key: Option<String>,
    /// Key column of the right table (first column when unset)
    pub right_key: Option<String>,
    /// Records per read or write call
    pub batch_size: usize,
    /// Format used when reading untyped text sources
    pub format: Format,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            merge_mode: MergeMode::default(),
            left_key: None,
            right_key: None,
            batch_size: DEFAULT_BATCH_SIZE,
            format: Format::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let merge_mode = match lookup("SYNC_MERGE_MODE") {
            Some(raw) => raw.parse()?,
            None => defaults.merge_mode,
        };

        let batch_size = match lookup("SYNC_BATCH_SIZE") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(size) if size > 0 => size,
                _ => return Err(ConfigError::InvalidBatchSize(raw)),
            },
            None => defaults.batch_size,
        };

        let mut format = defaults.format;
        if let Some(delimiter) = lookup("SYNC_MULTISELECT_DELIMITER") {
            format = format.with_delimiter(delimiter);
        }
        if let Some(time_format) = lookup("SYNC_TIME_FORMAT") {
            format = format.with_time_format(time_format);
        }

        Ok(Self {
            merge_mode,
            left_key: lookup("SYNC_LEFT_KEY"),
            right_key: lookup("SYNC_RIGHT_KEY"),
            batch_size,
            format,
        })
    }
}
