//! Operation reports.
//!
//! Bulk operations tolerate per-value conversion failures. Instead of
//! aborting they null the offending field and count it; the count and the
//! operation's outputs come back in an [`OpReport`].

use crate::{ColumnName, Table};
use serde::{Deserialize, Serialize};

/// Overall outcome of an operation that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpStatus {
    /// Every value converted cleanly
    Success,
    /// Completed, but some values were nulled
    CompletedWithErrors,
}

/// Report returned by operations that tolerate per-value failures.
#[derive(Debug, Clone, PartialEq)]
pub struct OpReport<T> {
    pub status: OpStatus,
    /// Number of values that could not be converted and were nulled
    pub non_critical_errors: usize,
    /// Operation-specific outputs
    pub returns: T,
}

impl<T> OpReport<T> {
    pub fn new(returns: T, non_critical_errors: usize) -> Self {
        let status = if non_critical_errors == 0 {
            OpStatus::Success
        } else {
            OpStatus::CompletedWithErrors
        };
        Self {
            status,
            non_critical_errors,
            returns,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.non_critical_errors == 0
    }
}

/// Outputs of [`Table::change_column_type`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeChange {
    /// Name of the column now holding the converted values
    pub new_column_name: ColumnName,
}

/// Outputs of [`Table::make_write_safe`].
#[derive(Debug, Clone)]
pub struct WriteSafe {
    /// Columns whose kind was converted, in column order
    pub converted: Vec<ColumnName>,
    pub safe_data: Table,
}

/// Outputs of [`crate::remap`].
#[derive(Debug, Clone)]
pub struct Remapped {
    pub remapped_data: Table,
    /// One report per retyped column, in map order
    pub type_change_results: Vec<OpReport<TypeChange>>,
    /// Map keys with no matching column in the source table
    pub missing_sources: Vec<ColumnName>,
}
