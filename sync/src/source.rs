//! Source roles: what a data source is, and how records move in and out.
//!
//! A source is described by a [`TableSpec`] and opened into a [`Source`],
//! which reads through [`SourceReader`] and writes through [`SourceWriter`].
//! Both directions page with a [`Cursor`]; repeating a call with the same
//! cursor yields the same result.

use crate::{error::Result, JsonFile, SyncError, TsvFile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tablesync_engine::{Column, DataMap, Format, Table};

/// Parameter naming the backing file of a file source.
pub const FILE_PATH: &str = "file_path";
/// Optional parameter overriding the multi-select delimiter of text reads.
pub const MULTISELECT_DELIMITER: &str = "multiselect_delimiter";
/// Optional parameter overriding the time pattern of text reads.
pub const TIME_FORMAT: &str = "time_format";

/// Kind of data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Json,
    Tsv,
}

impl SourceKind {
    /// Guess the kind from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(SourceKind::Json),
            Some("tsv") | Some("tab") | Some("txt") => Ok(SourceKind::Tsv),
            _ => Err(SyncError::IncorrectSource(format!(
                "cannot tell the source kind of {}",
                path.display()
            ))),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Json => write!(f, "json"),
            SourceKind::Tsv => write!(f, "tsv"),
        }
    }
}

/// Description of one table in a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    pub source: SourceKind,
    pub name: String,
    /// Source-specific settings, e.g. [`FILE_PATH`]
    pub parameters: BTreeMap<String, String>,
}

impl TableSpec {
    pub fn new(source: SourceKind, name: impl Into<String>) -> Self {
        Self {
            source,
            name: name.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Spec for a file, with the kind taken from its extension and the name
    /// from its stem.
    pub fn file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = SourceKind::from_path(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(source, name).with_parameter(FILE_PATH, path.to_string_lossy()))
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Attach the format used for text reads.
    pub fn with_format(self, format: &Format) -> Self {
        self.with_parameter(MULTISELECT_DELIMITER, &format.multiselect_delimiter)
            .with_parameter(TIME_FORMAT, &format.time_format)
    }

    /// A required parameter.
    pub fn parameter(&self, key: &str) -> Result<&str> {
        self.parameters
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| SyncError::ParameterNotFound(key.to_string()))
    }

    pub fn file_path(&self) -> Result<PathBuf> {
        self.parameter(FILE_PATH).map(PathBuf::from)
    }

    /// Format from the optional format parameters, defaults elsewhere.
    pub fn format(&self) -> Format {
        let mut format = Format::default();
        if let Some(delimiter) = self.parameters.get(MULTISELECT_DELIMITER) {
            format = format.with_delimiter(delimiter);
        }
        if let Some(time_format) = self.parameters.get(TIME_FORMAT) {
            format = format.with_time_format(time_format);
        }
        format
    }

    /// Fail unless this spec is for `expected`.
    pub(crate) fn expect_source(&self, expected: SourceKind) -> Result<()> {
        if self.source == expected {
            Ok(())
        } else {
            Err(SyncError::IncorrectSource(format!(
                "expected a {expected} table, got {}",
                self.source
            )))
        }
    }
}

/// Position of the next record to read or write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cursor(pub usize);

impl Cursor {
    pub fn start() -> Self {
        Cursor(0)
    }

    pub fn offset(self) -> usize {
        self.0
    }
}

/// One page of records and where the next page starts.
#[derive(Debug, Clone)]
pub struct ReadBatch {
    pub table: Table,
    /// `None` once the source is exhausted
    pub next: Option<Cursor>,
}

/// Row range covered by one page, and the cursor after it.
///
/// `limit` of `None` means everything from the cursor on.
pub(crate) fn page(total: usize, limit: Option<usize>, cursor: Option<Cursor>) -> (Range<usize>, Option<Cursor>) {
    let start = cursor.map_or(0, Cursor::offset).min(total);
    let end = limit.map_or(total, |limit| start.saturating_add(limit).min(total));
    let next = (end < total).then_some(Cursor(end));
    (start..end, next)
}

/// Reads tables out of a source.
#[allow(async_fn_in_trait)]
pub trait SourceReader {
    /// Tables this source holds.
    async fn get_tables(&self) -> Result<Vec<TableSpec>>;

    /// Columns of the table, as the source declares them.
    async fn get_columns(&self) -> Result<Vec<Column>>;

    /// Read up to `limit` records from `cursor` (the start when `None`).
    ///
    /// With a `mapping`, the page is remapped before it is returned.
    async fn read_records(
        &self,
        limit: Option<usize>,
        cursor: Option<Cursor>,
        mapping: Option<&DataMap>,
    ) -> Result<ReadBatch>;
}

/// Writes tables into a source.
#[allow(async_fn_in_trait)]
pub trait SourceWriter {
    /// Create (or replace) an empty table shaped like `table`.
    async fn create_table(&self, table: &Table) -> Result<TableSpec>;

    /// Write up to `limit` records of `table` starting at `cursor`.
    ///
    /// Anything previously written at or after the cursor is replaced.
    /// Returns the cursor of the next unwritten record, `None` when done.
    async fn write_records(
        &self,
        table: &Table,
        limit: Option<usize>,
        cursor: Option<Cursor>,
    ) -> Result<Option<Cursor>>;
}

/// An opened source of any supported kind.
#[derive(Debug, Clone)]
pub enum Source {
    Json(JsonFile),
    Tsv(TsvFile),
}

impl Source {
    pub fn open(spec: &TableSpec) -> Result<Self> {
        match spec.source {
            SourceKind::Json => JsonFile::open(spec).map(Source::Json),
            SourceKind::Tsv => TsvFile::open(spec).map(Source::Tsv),
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Source::Json(_) => SourceKind::Json,
            Source::Tsv(_) => SourceKind::Tsv,
        }
    }
}

impl SourceReader for Source {
    async fn get_tables(&self) -> Result<Vec<TableSpec>> {
        match self {
            Source::Json(file) => file.get_tables().await,
            Source::Tsv(file) => file.get_tables().await,
        }
    }

    async fn get_columns(&self) -> Result<Vec<Column>> {
        match self {
            Source::Json(file) => file.get_columns().await,
            Source::Tsv(file) => file.get_columns().await,
        }
    }

    async fn read_records(
        &self,
        limit: Option<usize>,
        cursor: Option<Cursor>,
        mapping: Option<&DataMap>,
    ) -> Result<ReadBatch> {
        match self {
            Source::Json(file) => file.read_records(limit, cursor, mapping).await,
            Source::Tsv(file) => file.read_records(limit, cursor, mapping).await,
        }
    }
}

impl SourceWriter for Source {
    async fn create_table(&self, table: &Table) -> Result<TableSpec> {
        match self {
            Source::Json(file) => file.create_table(table).await,
            Source::Tsv(file) => file.create_table(table).await,
        }
    }

    async fn write_records(
        &self,
        table: &Table,
        limit: Option<usize>,
        cursor: Option<Cursor>,
    ) -> Result<Option<Cursor>> {
        match self {
            Source::Json(file) => file.write_records(table, limit, cursor).await,
            Source::Tsv(file) => file.write_records(table, limit, cursor).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_extension() {
        assert_eq!(SourceKind::from_path(Path::new("a/b.json")).unwrap(), SourceKind::Json);
        assert_eq!(SourceKind::from_path(Path::new("notes.TSV")).unwrap(), SourceKind::Tsv);
        assert!(matches!(
            SourceKind::from_path(Path::new("deck.apkg")),
            Err(SyncError::IncorrectSource(_))
        ));
    }

    #[test]
    fn file_spec_parameters() {
        let spec = TableSpec::file("data/notes.tsv").unwrap();
        assert_eq!(spec.source, SourceKind::Tsv);
        assert_eq!(spec.name, "notes");
        assert_eq!(spec.file_path().unwrap(), PathBuf::from("data/notes.tsv"));
        assert_eq!(spec.format(), Format::default());

        let custom = Format::new(";", "%Y-%m-%d");
        assert_eq!(spec.with_format(&custom).format(), custom);
    }

    #[test]
    fn missing_file_path() {
        let spec = TableSpec::new(SourceKind::Json, "notes");
        assert!(matches!(
            spec.file_path(),
            Err(SyncError::ParameterNotFound(p)) if p == FILE_PATH
        ));
        assert!(matches!(Source::open(&spec), Err(SyncError::ParameterNotFound(_))));
    }

    #[test]
    fn paging() {
        assert_eq!(page(5, Some(2), None), (0..2, Some(Cursor(2))));
        assert_eq!(page(5, Some(2), Some(Cursor(4))), (4..5, None));
        assert_eq!(page(5, None, Some(Cursor(1))), (1..5, None));
        assert_eq!(page(5, Some(10), Some(Cursor(9))), (5..5, None));
        assert_eq!(page(0, Some(3), None), (0..0, None));
    }
}
