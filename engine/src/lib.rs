//! # Tablesync Engine
//!
//! An in-memory, typed, columnar table engine for reconciling record sets
//! from heterogeneous sources.
//!
//! The engine has no knowledge of files or network. Adapters (see the
//! `tablesync` crate) read a source into a [`Table`], the engine remaps,
//! retypes, merges and compares tables, and the adapters write the result
//! back.
//!
//! ## Core Concepts
//!
//! ### Columns and kinds
//!
//! Every column has a [`ColumnKind`]: `Text`, `Select`, `MultiSelect` or
//! `Date`. Values are [`Value`]s; [`Value::Null`] stands for an absent value
//! in any kind.
//!
//! ### Registry and slots
//!
//! Records are slot-indexed. The [`ColumnRegistry`] maps column names to
//! slots, so renaming or dropping a column never touches the records. Slots
//! freed by a drop are recycled by the next added column.
//!
//! ### Conversion
//!
//! [`Table::change_column_type`] converts between kinds under the table's
//! [`Format`] (multi-select delimiter and time pattern). Values that fail to
//! convert become null and are counted in the returned [`OpReport`].
//!
//! ### Relational operators
//!
//! - [`merge`] - keyed join with left/right/inner flags and a left-wins or
//!   overwrite conflict rule
//! - [`append`] - add left records onto the right table, optionally skipping
//!   duplicate keys
//! - [`Table::equivalent_to`] - order-independent record-set comparison
//! - [`remap`] - project a table onto a target schema described by a
//!   [`DataMap`]
//!
//! ## Quick Start
//!
//! ```rust
//! use tablesync_engine::{merge, Column, ColumnKind, MergeOptions, Table, Value};
//! use serde_json::json;
//!
//! // 1. Build two tables
//! let mut notes = Table::new(vec![Column::text("title"), Column::text("body")]).unwrap();
//! notes.add_record([("title", json!("a")), ("body", json!("first"))]);
//!
//! let mut tags = Table::new(vec![Column::text("title"), Column::text("tags")]).unwrap();
//! tags.add_record([("title", json!("a")), ("tags", json!("x,y"))]);
//!
//! // 2. Split the delimited text into a multi-select
//! let report = tags
//!     .change_column_type("tags", ColumnKind::MultiSelect, None, true)
//!     .unwrap();
//! assert!(report.is_clean());
//!
//! // 3. Join on the title
//! let merged = merge(&notes, &tags, "title", "title", MergeOptions::default()).unwrap();
//! assert_eq!(merged.len(), 1);
//! assert_eq!(
//!     merged.value(0, "tags").unwrap(),
//!     Some(&Value::from(vec!["x", "y"]))
//! );
//! ```

pub mod convert;
mod equivalence;
pub mod error;
pub mod format;
pub mod index;
pub mod ops;
pub mod record;
pub mod registry;
pub mod remap;
pub mod report;
pub mod schema;
pub mod table;
pub mod value;

// Re-export main types at crate root
pub use error::Error;
pub use format::Format;
pub use index::KeyIndex;
pub use ops::{
    append, combine_columns, have_same_columns, merge, merge_records, merge_values, MergeOptions,
};
pub use record::{RecordMut, RecordRef};
pub use registry::ColumnRegistry;
pub use remap::{remap, DataMap};
pub use report::{OpReport, OpStatus, Remapped, TypeChange, WriteSafe};
pub use schema::{Column, ColumnKind};
pub use table::Table;
pub use value::Value;

/// Type aliases for clarity
pub type ColumnName = String;
