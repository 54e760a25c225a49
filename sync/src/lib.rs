//! # Tablesync
//!
//! Flat-file adapters and a sync driver on top of [`tablesync_engine`].
//!
//! A source is named by a [`TableSpec`] and opened into a [`Source`]. Reads
//! and writes page through a [`Cursor`], so a caller can stream a large file
//! in batches and retry a failed page. [`combine`] joins or appends two
//! tables according to a [`MergeMode`]; [`sync_files`] runs the whole
//! read, combine, write cycle for two files.
//!
//! ## Sources
//!
//! - [`JsonFile`] - typed tables in a JSON document with a column header
//! - [`TsvFile`] - tab-separated text; columns read as Text unless a
//!   [`DataMap`](tablesync_engine::DataMap) types them

pub mod config;
pub mod error;
pub mod json_file;
mod row_file;
pub mod source;
pub mod sync;
pub mod tsv_file;

// Re-export main types at crate root
pub use config::Config;
pub use error::{ConfigError, Result, SyncError};
pub use json_file::JsonFile;
pub use source::{Cursor, ReadBatch, Source, SourceKind, SourceReader, SourceWriter, TableSpec};
pub use sync::{combine, read_all, sync_files, write_all, MergeMode, SyncSummary};
pub use tsv_file::TsvFile;
