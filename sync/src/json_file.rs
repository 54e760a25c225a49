//! JSON file adapter.
//!
//! A table is stored as one document:
//!
//! ```json
//! {
//!   "header": {
//!     "columns": { "Front": 0, "Tags": 2, "Created": 3 },
//!     "format": { "multiselect_delimiter": ",", "time_format": "%b %d, %Y %I:%M %p" }
//!   },
//!   "records": [ { "Front": "hello", "Tags": ["a", "b"], "Created": "Mar 23, 1994 12:01 PM" } ]
//! }
//! ```
//!
//! Column kinds are stored as integer codes. Date values are written as text
//! under the header's time format and parsed back on read.
//!
//! The parsed document is kept between pages of a read; a read from the
//! start reloads the file. Writes append each page at its record offset.

use crate::{
    error::Result,
    row_file::RowFile,
    source::{page, Cursor, ReadBatch, SourceKind, SourceReader, SourceWriter, TableSpec, FILE_PATH},
    SyncError,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tablesync_engine::{convert::convert, Column, ColumnKind, DataMap, Format, RecordRef, Table, Value};
use tokio::sync::Mutex;

type JsonObject = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    header: Header,
    #[serde(default)]
    records: Vec<JsonObject>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    columns: JsonObject,
    format: Format,
}

impl Header {
    fn from_table(table: &Table) -> Self {
        let columns = table
            .columns()
            .map(|c| (c.name.clone(), serde_json::Value::from(c.kind.code())))
            .collect();
        Self {
            columns,
            format: table.format().clone(),
        }
    }

    fn columns(&self) -> Result<Vec<Column>> {
        self.columns
            .iter()
            .map(|(name, code)| {
                code.as_u64()
                    .and_then(ColumnKind::from_code)
                    .map(|kind| Column::new(kind, name.clone()))
                    .ok_or_else(|| {
                        SyncError::InvalidDocument(format!("bad kind code {code} for column '{name}'"))
                    })
            })
            .collect()
    }
}

/// A table stored in a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
    name: String,
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    read: Option<Arc<Document>>,
    write: Option<RowFile>,
}

const RECORDS_END: &[u8] = b"\n  ]\n}\n";

impl JsonFile {
    pub fn open(spec: &TableSpec) -> Result<Self> {
        spec.expect_source(SourceKind::Json)?;
        Ok(Self {
            path: spec.file_path()?,
            name: spec.name.clone(),
            state: Arc::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn spec(&self) -> TableSpec {
        TableSpec::new(SourceKind::Json, &self.name)
            .with_parameter(FILE_PATH, self.path.to_string_lossy())
    }

    async fn load(&self) -> Result<Document> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| SyncError::file(&self.path, e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Parsed document for a read at `cursor`, reloaded when reading from the start.
    async fn document(&self, cursor: Option<Cursor>) -> Result<Arc<Document>> {
        let mut state = self.state.lock().await;
        if cursor.is_some_and(|c| c.offset() > 0) {
            if let Some(document) = &state.read {
                return Ok(Arc::clone(document));
            }
        }
        let document = Arc::new(self.load().await?);
        state.read = Some(Arc::clone(&document));
        Ok(document)
    }

    /// Write `header` and `records` as a fresh document.
    async fn create(&self, header: &Header, records: &[JsonObject]) -> Result<RowFile> {
        let mut prefix = b"{\n  \"header\": ".to_vec();
        serde_json::to_writer(&mut prefix, header)?;
        prefix.extend_from_slice(b",\n  \"records\": [");
        let rows = encode(records, 0)?;
        RowFile::create(&self.path, &prefix, rows, RECORDS_END.to_vec()).await
    }
}

/// Encode records as the array elements at `first` onwards.
fn encode(records: &[JsonObject], first: usize) -> Result<Vec<Vec<u8>>> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let mut row = if first + i == 0 {
                b"\n    ".to_vec()
            } else {
                b",\n    ".to_vec()
            };
            serde_json::to_writer(&mut row, record)?;
            Ok(row)
        })
        .collect()
}

/// JSON object of a record, with dates rendered under `format`.
///
/// Returns the object and the number of dates that failed to render, which
/// are written as null.
fn to_object(record: RecordRef<'_>, format: &Format) -> (JsonObject, usize) {
    let mut errors = 0;
    let object = record
        .iter()
        .map(|(name, value)| {
            let json = match value {
                Value::Date(_) => match convert(value, ColumnKind::Date, ColumnKind::Text, format) {
                    Ok(text) => text.to_json(),
                    Err(_) => {
                        errors += 1;
                        serde_json::Value::Null
                    }
                },
                other => other.to_json(),
            };
            (name.to_string(), json)
        })
        .collect();
    (object, errors)
}

impl SourceReader for JsonFile {
    async fn get_tables(&self) -> Result<Vec<TableSpec>> {
        Ok(vec![self.spec()])
    }

    async fn get_columns(&self) -> Result<Vec<Column>> {
        self.document(None).await?.header.columns()
    }

    async fn read_records(
        &self,
        limit: Option<usize>,
        cursor: Option<Cursor>,
        mapping: Option<&DataMap>,
    ) -> Result<ReadBatch> {
        let document = self.document(cursor).await?;
        let columns = document.header.columns()?;

        // dates arrive as text and are parsed once the page is in
        let date_columns: Vec<String> = columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Date)
            .map(|c| c.name.clone())
            .collect();
        let stored = columns.into_iter().map(|c| match c.kind {
            ColumnKind::Date => Column::text(c.name),
            _ => c,
        });
        let mut table = Table::with_format(stored, document.header.format.clone())?;

        let (rows, next) = page(document.records.len(), limit, cursor);
        for record in &document.records[rows.clone()] {
            table.add_record(record.iter().map(|(name, value)| (name, Value::from(value.clone()))));
        }

        for name in &date_columns {
            let report = table.change_column_type(name, ColumnKind::Date, None, true)?;
            if !report.is_clean() {
                tracing::warn!(
                    path = %self.path.display(),
                    column = %name,
                    errors = report.non_critical_errors,
                    "unparseable dates read as null"
                );
            }
        }

        if let Some(map) = mapping {
            table = table.remap(map)?.returns.remapped_data;
        }

        tracing::info!(path = %self.path.display(), start = rows.start, records = table.len(), "read JSON page");
        Ok(ReadBatch { table, next })
    }
}

impl SourceWriter for JsonFile {
    async fn create_table(&self, table: &Table) -> Result<TableSpec> {
        let mut state = self.state.lock().await;
        state.write = Some(self.create(&Header::from_table(table), &[]).await?);
        state.read = None;
        tracing::info!(path = %self.path.display(), columns = table.column_count(), "created JSON table");
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
        let mut records = Vec::with_capacity(rows.len());
        for record in rows.clone().filter_map(|row| table.record(row)) {
            let (object, failed) = to_object(record, table.format());
            errors += failed;
            records.push(object);
        }
        if errors > 0 {
            tracing::warn!(
                path = %self.path.display(),
                start = rows.start,
                errors,
                "unrenderable dates written as null"
            );
        }

        let file = match &mut state.write {
            Some(file) => file,
            slot => {
                // adopt a document this adapter did not create
                let mut existing = self.load().await?;
                existing.records.truncate(rows.start);
                slot.insert(self.create(&existing.header, &existing.records).await?)
            }
        };
        let start = rows.start.min(file.rows());
        file.replace_from(start, encode(&records, start)?).await?;

        tracing::info!(path = %self.path.display(), start, records = rows.len(), "wrote JSON page");
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn dates_render_under_the_table_format() {
        let date = NaiveDate::from_ymd_opt(2021, 5, 13)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut table = Table::with_format(vec![Column::text("a"), Column::text("b")], Format::new(",", "%Y/%m/%d")).unwrap();
        table.add_record([("a", Value::Date(date)), ("b", Value::from(vec!["x"]))]);

        let (object, errors) = to_object(table.record(0).unwrap(), table.format());
        assert_eq!(errors, 0);
        assert_eq!(object["a"], json!("2021/05/13"));
        assert_eq!(object["b"], json!(["x"]));
    }

    #[tokio::test]
    async fn empty_document_parses() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.json");
        let file = JsonFile::open(&TableSpec::file(&path).unwrap()).unwrap();

        file.create_table(&Table::new(vec![Column::select("deck")]).unwrap()).await.unwrap();
        let batch = file.read_records(None, None, None).await.unwrap();
        assert!(batch.table.is_empty());
        assert_eq!(batch.table.column("deck").unwrap().kind, ColumnKind::Select);
    }

    #[tokio::test]
    async fn writes_into_a_document_it_did_not_create() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        std::fs::write(
            &path,
            serde_json::to_vec(&json!({
                "header": {"columns": {"id": 0}, "format": {"multiselect_delimiter": ",", "time_format": "%Y"}},
                "records": [{"id": "1"}, {"id": "2"}, {"id": "3"}]
            }))
            .unwrap(),
        )
        .unwrap();

        let mut table = Table::new(vec![Column::text("id")]).unwrap();
        table.add_records([[("id", "a")], [("id", "b")], [("id", "c")]]);

        let file = JsonFile::open(&TableSpec::file(&path).unwrap()).unwrap();
        file.write_records(&table, Some(1), Some(Cursor(1))).await.unwrap();

        let raw: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["records"], json!([{"id": "1"}, {"id": "b"}]));
        assert_eq!(raw["header"]["format"]["time_format"], "%Y");
    }
}
