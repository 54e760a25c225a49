//! Integration tests for the file adapters and the sync driver.

use serde_json::json;
use std::path::{Path, PathBuf};
use tablesync::{
    read_all, sync_files, write_all, Config, Cursor, JsonFile, MergeMode, Source, SourceReader,
    SourceWriter, SyncError, TableSpec, TsvFile,
};
use tablesync_engine::{Column, ColumnKind, DataMap, Format, Table, Value};
use tempfile::TempDir;

fn sample_table() -> Table {
    let mut table = Table::new(vec![
        Column::text("Front"),
        Column::multi_select("Tags"),
        Column::select("Deck"),
        Column::text("Created"),
    ])
    .unwrap();
    table.add_record([
        ("Front", json!("hello")),
        ("Tags", json!(["a", "b"])),
        ("Deck", json!("lang")),
        ("Created", json!(null)),
    ]);
    table.add_record([
        ("Front", json!("world")),
        ("Tags", json!([])),
        ("Deck", json!(null)),
        ("Created", json!("Mar 23, 1994 12:01 PM")),
    ]);
    table.add_record([("Front", json!("again"))]);
    table
        .change_column_type("Created", ColumnKind::Date, None, true)
        .unwrap();
    table
}

fn open(path: &Path) -> Source {
    Source::open(&TableSpec::file(path).unwrap()).unwrap()
}

fn path_in(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

// ============================================================================
// JSON
// ============================================================================

#[tokio::test]
async fn json_round_trip_keeps_types() {
    let dir = TempDir::new().unwrap();
    let path = path_in(&dir, "notes.json");
    let table = sample_table();

    let source = open(&path);
    let spec = write_all(&source, &table, 2).await.unwrap();
    assert_eq!(spec.name, "notes");

    let back = read_all(&source, 2, None).await.unwrap();
    assert_eq!(back.column("Created").unwrap().kind, ColumnKind::Date);
    assert_eq!(back.column("Tags").unwrap().kind, ColumnKind::MultiSelect);
    assert!(back.equivalent_to(&table, None).unwrap());
    assert_eq!(source.get_columns().await.unwrap(), table.columns().cloned().collect::<Vec<_>>());
}

#[tokio::test]
async fn json_document_layout() {
    let dir = TempDir::new().unwrap();
    let path = path_in(&dir, "notes.json");
    let file = JsonFile::open(&TableSpec::file(&path).unwrap()).unwrap();

    write_all(&file, &sample_table(), 100).await.unwrap();

    let raw: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(
        raw["header"]["columns"],
        json!({"Front": 0, "Tags": 2, "Deck": 1, "Created": 3})
    );
    assert_eq!(raw["header"]["format"]["multiselect_delimiter"], ",");
    assert_eq!(raw["records"][1]["Created"], "Mar 23, 1994 12:01 PM");
    assert_eq!(raw["records"][0]["Tags"], json!(["a", "b"]));
    assert_eq!(raw["records"][2]["Deck"], json!(null));

    let keys: Vec<&String> = raw["header"]["columns"].as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["Front", "Tags", "Deck", "Created"]);
}

#[tokio::test]
async fn json_paged_read_and_retry() {
    let dir = TempDir::new().unwrap();
    let path = path_in(&dir, "notes.json");
    let source = open(&path);
    write_all(&source, &sample_table(), 100).await.unwrap();

    let first = source.read_records(Some(2), None, None).await.unwrap();
    assert_eq!(first.table.len(), 2);
    assert_eq!(first.next, Some(Cursor(2)));

    let second = source.read_records(Some(2), first.next, None).await.unwrap();
    let retried = source.read_records(Some(2), first.next, None).await.unwrap();
    assert_eq!(second.table.len(), 1);
    assert_eq!(second.next, None);
    assert!(second.table.equivalent_to(&retried.table, None).unwrap());
    assert_eq!(second.table.value(0, "Front").unwrap(), Some(&Value::from("again")));
}

#[tokio::test]
async fn rewriting_a_page_replaces_it() {
    let dir = TempDir::new().unwrap();
    let path = path_in(&dir, "notes.json");
    let source = open(&path);
    let table = sample_table();

    source.create_table(&table).await.unwrap();
    let next = source.write_records(&table, Some(2), None).await.unwrap();
    assert_eq!(next, Some(Cursor(2)));
    // a retried page must not duplicate records
    source.write_records(&table, Some(2), Some(Cursor(0))).await.unwrap();
    let done = source.write_records(&table, Some(2), next).await.unwrap();
    assert_eq!(done, None);

    let back = read_all(&source, 10, None).await.unwrap();
    assert_eq!(back.len(), 3);
}

#[tokio::test]
async fn paged_writes_match_a_single_write() {
    let dir = TempDir::new().unwrap();
    let mut table = Table::new(vec![Column::text("id"), Column::multi_select("tags")]).unwrap();
    for i in 0..250 {
        table.add_record([("id", json!(i.to_string())), ("tags", json!(["x", i.to_string()]))]);
    }

    for name in ["notes.json", "notes.tsv"] {
        let paged = path_in(&dir, &format!("paged-{name}"));
        let whole = path_in(&dir, &format!("whole-{name}"));
        write_all(&open(&paged), &table, 7).await.unwrap();
        write_all(&open(&whole), &table, 1000).await.unwrap();
        assert_eq!(std::fs::read(&paged).unwrap(), std::fs::read(&whole).unwrap());

        let source = open(&paged);
        let back = read_all(&source, 7, None).await.unwrap();
        assert_eq!(back.len(), 250);
        assert_eq!(back.value(249, "id").unwrap(), Some(&Value::from("249")));
    }
}

#[tokio::test]
async fn json_read_with_mapping() {
    let dir = TempDir::new().unwrap();
    let path = path_in(&dir, "notes.json");
    let source = open(&path);
    write_all(&source, &sample_table(), 100).await.unwrap();

    let map = DataMap::new(Format::default())
        .with_column("Front", Column::text("question"))
        .with_column("Tags", Column::text("tags"));
    let table = read_all(&source, 100, Some(&map)).await.unwrap();

    assert_eq!(table.column_names(), vec!["question", "tags"]);
    assert_eq!(table.value(0, "tags").unwrap(), Some(&Value::from("a,b")));
}

#[tokio::test]
async fn missing_file_is_a_file_error() {
    let dir = TempDir::new().unwrap();
    let source = open(&path_in(&dir, "absent.json"));
    assert!(matches!(
        source.read_records(None, None, None).await,
        Err(SyncError::FileError { .. })
    ));
}

#[tokio::test]
async fn bad_kind_code_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = path_in(&dir, "bad.json");
    std::fs::write(
        &path,
        serde_json::to_vec(&json!({
            "header": {"columns": {"a": 9}, "format": {"multiselect_delimiter": ",", "time_format": "%Y"}},
            "records": []
        }))
        .unwrap(),
    )
    .unwrap();

    assert!(matches!(
        open(&path).get_columns().await,
        Err(SyncError::InvalidDocument(_))
    ));
}

// ============================================================================
// TSV
// ============================================================================

#[tokio::test]
async fn tsv_write_flattens_to_text() {
    let dir = TempDir::new().unwrap();
    let path = path_in(&dir, "notes.tsv");
    let source = open(&path);

    write_all(&source, &sample_table(), 2).await.unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Front\tTags\tDeck\tCreated");
    assert_eq!(lines[1], "hello\ta,b\tlang\t");
    assert_eq!(lines[2], "world\t\t\tMar 23, 1994 12:01 PM");
    assert_eq!(lines.len(), 4);

    let columns = source.get_columns().await.unwrap();
    assert!(columns.iter().all(|c| c.kind == ColumnKind::Text));
}

#[tokio::test]
async fn tsv_write_renders_values_held_in_text_columns() {
    let dir = TempDir::new().unwrap();
    let path = path_in(&dir, "notes.tsv");
    let source = open(&path);

    let mut table = Table::with_format(
        vec![Column::text("id"), Column::text("tags"), Column::text("when")],
        Format::new(";", "%Y-%m-%d"),
    )
    .unwrap();
    table.add_record([("id", json!("1")), ("tags", json!(["a", "b"])), ("when", json!(null))]);
    let when = chrono::NaiveDate::from_ymd_opt(2021, 5, 13)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    table.record_mut(0).unwrap().set("when", Value::Date(when)).unwrap();

    write_all(&source, &table, 100).await.unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "id\ttags\twhen\n1\ta;b\t2021-05-13\n");

    let back = read_all(&source, 100, None).await.unwrap();
    assert_eq!(back.value(0, "tags").unwrap(), Some(&Value::from("a;b")));
}

#[tokio::test]
async fn tsv_read_with_mapping_types_columns() {
    let dir = TempDir::new().unwrap();
    let path = path_in(&dir, "notes.tsv");
    std::fs::write(
        &path,
        "Front\tTags\tWhen\tNoise\nq1\tx;y\t2021-05-13\tz\nq2\t\tnever\tz\n",
    )
    .unwrap();

    let map = DataMap::new(Format::new(";", "%Y-%m-%d"))
        .with_column("Front", Column::text("Front"))
        .with_column("Tags", Column::multi_select("Tags"))
        .with_column("When", Column::date("Created"));
    let file = TsvFile::open(&TableSpec::file(&path).unwrap()).unwrap();
    let table = read_all(&file, 1, Some(&map)).await.unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(table.column_names(), vec!["Front", "Tags", "Created"]);
    assert_eq!(table.column("Created").unwrap().kind, ColumnKind::Date);
    assert_eq!(table.value(0, "Tags").unwrap(), Some(&Value::from(vec!["x", "y"])));
    assert!(matches!(table.value(0, "Created").unwrap(), Some(Value::Date(_))));
    assert_eq!(table.value(1, "Tags").unwrap(), Some(&Value::Null));
    assert_eq!(table.value(1, "Created").unwrap(), Some(&Value::Null));
}

#[tokio::test]
async fn tsv_spec_format_applies_to_reads() {
    let dir = TempDir::new().unwrap();
    let path = path_in(&dir, "notes.tsv");
    std::fs::write(&path, "id\n1\n").unwrap();

    let spec = TableSpec::file(&path).unwrap().with_format(&Format::new("|", "%Y"));
    let batch = Source::open(&spec).unwrap().read_records(None, None, None).await.unwrap();
    assert_eq!(batch.table.format(), &Format::new("|", "%Y"));
    assert_eq!(batch.table.value(0, "id").unwrap(), Some(&Value::from("1")));
}

// ============================================================================
// Driver
// ============================================================================

#[tokio::test]
async fn sync_files_soft_merges_json_and_tsv() {
    let dir = TempDir::new().unwrap();
    let left = path_in(&dir, "left.tsv");
    let right = path_in(&dir, "right.json");
    let output = path_in(&dir, "out.json");

    std::fs::write(&left, "id\tbody\n1\tfrom left\n2\t\n").unwrap();

    let mut right_table = Table::new(vec![Column::text("id"), Column::text("body"), Column::text("extra")]).unwrap();
    right_table.add_record([("id", "2"), ("body", "from right"), ("extra", "e2")]);
    right_table.add_record([("id", "3"), ("body", "only right"), ("extra", "e3")]);
    write_all(&open(&right), &right_table, 10).await.unwrap();

    let config = Config {
        batch_size: 1,
        ..Config::default()
    };
    let summary = sync_files(&config, &left, &right, &output).await.unwrap();
    assert_eq!(summary.left_records, 2);
    assert_eq!(summary.right_records, 2);
    assert_eq!(summary.written_records, 3);
    assert_eq!(summary.output.name, "out");

    let out = read_all(&open(&output), 10, None).await.unwrap();
    assert_eq!(out.column_names(), vec!["id", "body", "extra"]);
    // shared key first, then left-only, then right-only
    assert_eq!(out.value(0, "id").unwrap(), Some(&Value::from("2")));
    assert_eq!(out.value(0, "body").unwrap(), Some(&Value::from("from right")));
    assert_eq!(out.value(0, "extra").unwrap(), Some(&Value::from("e2")));
    assert_eq!(out.value(1, "body").unwrap(), Some(&Value::from("from left")));
    assert_eq!(out.value(2, "id").unwrap(), Some(&Value::from("3")));
}

#[tokio::test]
async fn sync_files_append_no_duplicates() {
    let dir = TempDir::new().unwrap();
    let left = path_in(&dir, "left.tsv");
    let right = path_in(&dir, "right.tsv");
    let output = path_in(&dir, "out.tsv");

    std::fs::write(&left, "id\tbody\n1\ta\n1\tb\n2\tc\n").unwrap();
    std::fs::write(&right, "id\tbody\n2\tz\n").unwrap();

    let config = Config {
        merge_mode: MergeMode::AppendNoDuplicates,
        left_key: Some("id".into()),
        right_key: Some("id".into()),
        ..Config::default()
    };
    let summary = sync_files(&config, &left, &right, &output).await.unwrap();
    assert_eq!(summary.written_records, 2);

    let text = std::fs::read_to_string(&output).unwrap();
    assert_eq!(text, "id\tbody\n2\tz\n1\ta\n");
}

#[tokio::test]
async fn sync_files_rejects_unknown_extension() {
    let dir = TempDir::new().unwrap();
    let left = path_in(&dir, "left.apkg");
    let right = path_in(&dir, "right.tsv");
    let output = path_in(&dir, "out.tsv");

    assert!(matches!(
        sync_files(&Config::default(), &left, &right, &output).await,
        Err(SyncError::IncorrectSource(_))
    ));
}
