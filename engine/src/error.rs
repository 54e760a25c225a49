//! Error types for the tablesync engine.

use crate::{ColumnKind, ColumnName};
use thiserror::Error;

/// All possible errors from the tablesync engine.
///
/// Schema errors abort the enclosing call without touching the receiver.
/// [`Error::CannotConvert`] is the only per-value error; bulk operations
/// recover from it locally and count it in their report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Schema errors
    #[error("column not found: {0}")]
    ColumnNotFound(ColumnName),

    #[error("column already exists: {0}")]
    ColumnAlreadyExists(ColumnName),

    #[error("no conversion from {from} to {to}")]
    TypeIncompatible { from: ColumnKind, to: ColumnKind },

    #[error("column '{column}' has type {left} on the left but {right} on the right")]
    ColumnTypeIncompatible {
        column: ColumnName,
        left: ColumnKind,
        right: ColumnKind,
    },

    // Data errors
    #[error("cannot convert value from {from} to {to}: {reason}")]
    CannotConvert {
        from: ColumnKind,
        to: ColumnKind,
        reason: String,
    },
}

impl Error {
    /// Whether this error is a per-value data error rather than a schema error.
    pub fn is_data_error(&self) -> bool {
        matches!(self, Error::CannotConvert { .. })
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
