//! Formatting configuration for text conversions.

use serde::{Deserialize, Serialize};

/// Default multi-value delimiter.
pub const DEFAULT_MULTISELECT_DELIMITER: &str = ",";

/// Default timestamp pattern (`Mar 23, 1994 12:01 PM`).
pub const DEFAULT_TIME_FORMAT: &str = "%b %d, %Y %I:%M %p";

/// Settings governing Text ↔ typed conversions for a table.
///
/// `time_format` is a strftime-style pattern as understood by
/// [`chrono::format::strftime`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Format {
    pub multiselect_delimiter: String,
    pub time_format: String,
}

impl Format {
    pub fn new(multiselect_delimiter: impl Into<String>, time_format: impl Into<String>) -> Self {
        Self {
            multiselect_delimiter: multiselect_delimiter.into(),
            time_format: time_format.into(),
        }
    }

    /// Builder-style override of the delimiter.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.multiselect_delimiter = delimiter.into();
        self
    }

    /// Builder-style override of the time pattern.
    pub fn with_time_format(mut self, time_format: impl Into<String>) -> Self {
        self.time_format = time_format.into();
        self
    }
}

impl Default for Format {
    fn default() -> Self {
        Self::new(DEFAULT_MULTISELECT_DELIMITER, DEFAULT_TIME_FORMAT)
    }
}
