//! Column definitions.
//!
//! A column is a named, typed slot definition shared by every record in a
//! table. Text is the universal representation; the other kinds are typed
//! refinements used by particular sources.

use crate::ColumnName;
use serde::{Deserialize, Serialize};

/// Semantic kinds a column can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Plain text. Most flashcard fields, hosted-database text properties.
    Text,
    /// Single categorical value, stored as text.
    Select,
    /// Multi-valued tags.
    MultiSelect,
    /// Timestamp.
    Date,
}

impl ColumnKind {
    /// All kinds, in code order.
    pub const ALL: [ColumnKind; 4] = [
        ColumnKind::Text,
        ColumnKind::Select,
        ColumnKind::MultiSelect,
        ColumnKind::Date,
    ];

    /// Integer code used by the persisted file header.
    pub fn code(self) -> u8 {
        match self {
            ColumnKind::Text => 0,
            ColumnKind::Select => 1,
            ColumnKind::MultiSelect => 2,
            ColumnKind::Date => 3,
        }
    }

    /// Inverse of [`ColumnKind::code`].
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(ColumnKind::Text),
            1 => Some(ColumnKind::Select),
            2 => Some(ColumnKind::MultiSelect),
            3 => Some(ColumnKind::Date),
            _ => None,
        }
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::Text => write!(f, "Text"),
            ColumnKind::Select => write!(f, "Select"),
            ColumnKind::MultiSelect => write!(f, "MultiSelect"),
            ColumnKind::Date => write!(f, "Date"),
        }
    }
}

/// Definition of a column in a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Declared kind
    pub kind: ColumnKind,
    /// Column name, unique within a table
    pub name: ColumnName,
}

impl Column {
    /// Create a new column definition.
    pub fn new(kind: ColumnKind, name: impl Into<ColumnName>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn text(name: impl Into<ColumnName>) -> Self {
        Self::new(ColumnKind::Text, name)
    }

    pub fn select(name: impl Into<ColumnName>) -> Self {
        Self::new(ColumnKind::Select, name)
    }

    pub fn multi_select(name: impl Into<ColumnName>) -> Self {
        Self::new(ColumnKind::MultiSelect, name)
    }

    pub fn date(name: impl Into<ColumnName>) -> Self {
        Self::new(ColumnKind::Date, name)
    }
}
