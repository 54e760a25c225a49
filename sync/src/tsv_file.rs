//! TSV file adapter.
//!
//! The first row holds the column names. Every column reads back as Text,
//! empty cells as null; pass a [`DataMap`] to type the columns on read.
//! Writes flatten every value to text and leave nulls empty.
//!
//! Parsed rows are kept between pages of a read; a read from the start
//! reloads the file. Writes append each page at its row offset.

use crate::{
    error::Result,
    row_file::RowFile,
    source::{page, Cursor, ReadBatch, SourceKind, SourceReader, SourceWriter, TableSpec, FILE_PATH},
    SyncError,
};
use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tablesync_engine::{convert::convert, Column, ColumnKind, DataMap, Format, Table, Value};
use tokio::sync::Mutex;

const DELIMITER: u8 = b'\t';

/// A table stored in a tab-separated file.
#[derive(Debug, Clone)]
pub struct TsvFile {
    path: PathBuf,
    name: String,
    format: Format,
    state: Arc<Mutex<State>>,
}

#[derive(Debug)]
struct Contents {
    header: Vec<String>,
    rows: Vec<StringRecord>,
}

#[derive(Debug, Default)]
struct State {
    read: Option<Arc<Contents>>,
    write: Option<RowFile>,
}

impl TsvFile {
    pub fn open(spec: &TableSpec) -> Result<Self> {
        spec.expect_source(SourceKind::Tsv)?;
        Ok(Self {
            path: spec.file_path()?,
            name: spec.name.clone(),
            format: spec.format(),
            state: Arc::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn spec(&self) -> TableSpec {
        TableSpec::new(SourceKind::Tsv, &self.name)
            .with_parameter(FILE_PATH, self.path.to_string_lossy())
            .with_format(&self.format)
    }

    async fn load(&self) -> Result<Contents> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| SyncError::file(&self.path, e))?;
        let mut reader = ReaderBuilder::new()
            .delimiter(DELIMITER)
            .flexible(true)
            .from_reader(bytes.as_slice());

        let header = reader.headers()?.iter().map(str::to_string).collect();
        let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Contents { header, rows })
    }

    /// Parsed file for a read at `cursor`, reloaded when reading from the start.
    async fn contents(&self, cursor: Option<Cursor>) -> Result<Arc<Contents>> {
        let mut state = self.state.lock().await;
        if cursor.is_some_and(|c| c.offset() > 0) {
            if let Some(contents) = &state.read {
                return Ok(Arc::clone(contents));
            }
        }
        let contents = Arc::new(self.load().await?);
        state.read = Some(Arc::clone(&contents));
        Ok(contents)
    }

    /// Encode rows as TSV lines, one buffer per row.
    fn encode<R, F>(&self, rows: impl IntoIterator<Item = R>) -> Result<Vec<Vec<u8>>>
    where
        R: IntoIterator<Item = F>,
        F: AsRef<[u8]>,
    {
        let mut writer = WriterBuilder::new()
            .delimiter(DELIMITER)
            .terminator(Terminator::Any(b'\n'))
            .flexible(true)
            .from_writer(Vec::new());
        let mut ends = Vec::new();
        for row in rows {
            writer.write_record(row)?;
            writer.flush().map_err(|e| SyncError::file(&self.path, e))?;
            ends.push(writer.get_ref().len());
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| SyncError::file(&self.path, e.into_error()))?;

        let mut start = 0;
        Ok(ends
            .into_iter()
            .map(|end| {
                let row = bytes[start..end].to_vec();
                start = end;
                row
            })
            .collect())
    }

    async fn create(&self, header: &[&str], rows: Vec<Vec<u8>>) -> Result<RowFile> {
        let prefix = self.encode([header])?.concat();
        RowFile::create(&self.path, &prefix, rows, Vec::new()).await
    }
}

/// Text form of a value, whatever column it sits in.
///
/// Nulls render empty; lists join and dates render under `format`.
fn cell(value: &Value, format: &Format) -> Result<String> {
    let kind = match value {
        Value::Null => return Ok(String::new()),
        Value::Text(s) => return Ok(s.clone()),
        Value::List(_) => ColumnKind::MultiSelect,
        Value::Date(_) => ColumnKind::Date,
    };
    let text = convert(value, kind, ColumnKind::Text, format)?;
    Ok(text.as_text().unwrap_or_default().to_string())
}

impl SourceReader for TsvFile {
    async fn get_tables(&self) -> Result<Vec<TableSpec>> {
        Ok(vec![self.spec()])
    }

    async fn get_columns(&self) -> Result<Vec<Column>> {
        let contents = self.contents(None).await?;
        Ok(contents.header.iter().cloned().map(Column::text).collect())
    }

    async fn read_records(
        &self,
        limit: Option<usize>,
        cursor: Option<Cursor>,
        mapping: Option<&DataMap>,
    ) -> Result<ReadBatch> {
        let contents = self.contents(cursor).await?;
        let format = mapping.map_or_else(|| self.format.clone(), |map| map.format.clone());
        let mut table = Table::with_format(contents.header.iter().cloned().map(Column::text), format)?;

        let (rows, next) = page(contents.rows.len(), limit, cursor);
        for row in &contents.rows[rows.clone()] {
            table.add_record(contents.header.iter().zip(row.iter()).map(|(name, cell)| {
                let value = if cell.is_empty() {
                    Value::Null
                } else {
                    Value::from(cell)
                };
                (name, value)
            }));
        }

        if let Some(map) = mapping {
            let report = table.remap(map)?;
            if !report.is_clean() {
                tracing::warn!(
                    path = %self.path.display(),
                    errors = report.non_critical_errors,
                    "values failed to convert while remapping"
                );
            }
            table = report.returns.remapped_data;
        }

        tracing::info!(path = %self.path.display(), start = rows.start, records = table.len(), "read TSV page");
        Ok(ReadBatch { table, next })
    }
}

impl SourceWriter for TsvFile {
    async fn create_table(&self, table: &Table) -> Result<TableSpec> {
        let mut state = self.state.lock().await;
        state.write = Some(self.create(&table.column_names(), Vec::new()).await?);
        state.read = None;
        tracing::info!(path = %self.path.display(), columns = table.column_count(), "created TSV table");
        Ok(self.spec())
    }

    async fn write_records(
        &self,
        table: &Table,
        limit: Option<usize>,
        cursor: Option<Cursor>,
    ) -> Result<Option<Cursor>> {
        let mut state = self.state.lock().await;
        state.read = None;

        let (rows, next) = page(table.len(), limit, cursor);
        let mut errors = 0;
        let mut lines = Vec::with_capacity(rows.len());
        for record in rows.clone().filter_map(|row| table.record(row)) {
            let line: Vec<String> = record
                .iter()
                .map(|(_, value)| {
                    cell(value, table.format()).unwrap_or_else(|_| {
                        errors += 1;
                        String::new()
                    })
                })
                .collect();
            lines.push(line);
        }
        if errors > 0 {
            tracing::warn!(
                path = %self.path.display(),
                start = rows.start,
                errors,
                "values failed to render as text and were left empty"
            );
        }
        let encoded = self.encode(lines)?;

        let file = match &mut state.write {
            Some(file) => file,
            slot => {
                // adopt a file this adapter did not create
                let existing = self.load().await?;
                let kept = existing.rows.iter().take(rows.start);
                let file = self.create(&table.column_names(), self.encode(kept)?).await?;
                slot.insert(file)
            }
        };
        file.replace_from(rows.start, encoded).await?;

        tracing::info!(path = %self.path.display(), start = rows.start, records = rows.len(), "wrote TSV page");
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn cells_render_every_value_as_text() {
        let format = Format::new("|", "%Y-%m-%d");
        let date = NaiveDate::from_ymd_opt(2021, 5, 13)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(cell(&Value::from("a"), &format).unwrap(), "a");
        assert_eq!(cell(&Value::Null, &format).unwrap(), "");
        assert_eq!(cell(&Value::from(vec!["a", "b"]), &format).unwrap(), "a|b");
        assert_eq!(cell(&Value::Date(date), &format).unwrap(), "2021-05-13");
    }

    #[tokio::test]
    async fn writes_into_a_file_it_did_not_create() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.tsv");
        std::fs::write(&path, "id\n1\n2\n3\n").unwrap();

        let mut table = Table::new(vec![Column::text("id")]).unwrap();
        table.add_records([[("id", "a")], [("id", "b")], [("id", "c")]]);

        let file = TsvFile::open(&TableSpec::file(&path).unwrap()).unwrap();
        let next = file.write_records(&table, Some(1), Some(Cursor(1))).await.unwrap();
        assert_eq!(next, Some(Cursor(2)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "id\n1\nb\n");
    }

    #[tokio::test]
    async fn later_pages_reuse_the_parsed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.tsv");
        std::fs::write(&path, "id\n1\n2\n").unwrap();

        let file = TsvFile::open(&TableSpec::file(&path).unwrap()).unwrap();
        let first = file.read_records(Some(1), None, None).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        let second = file.read_records(Some(1), first.next, None).await.unwrap();
        assert_eq!(second.table.value(0, "id").unwrap(), Some(&Value::from("2")));
        // a read from the start goes back to disk
        assert!(file.read_records(Some(1), None, None).await.is_err());
    }

    #[test]
    fn rejects_json_spec() {
        let spec = TableSpec::file("notes.json").unwrap();
        assert!(matches!(TsvFile::open(&spec), Err(SyncError::IncorrectSource(_))));
    }
}
