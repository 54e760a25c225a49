//! Sync orchestration: read whole tables, combine them, write the result.

use crate::{
    error::{ConfigError, Result},
    source::{Cursor, Source, SourceReader, SourceWriter, TableSpec},
    Config, SyncError,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tablesync_engine::{append, merge, DataMap, MergeOptions, Table};

/// How two tables are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Add every left record onto the right table
    Append,
    /// Add left records whose key the right table lacks, once per key
    AppendNoDuplicates,
    /// Keyed outer join; right values only fill left nulls
    #[default]
    SoftMerge,
    /// Keyed outer join; right values replace left values
    HardMerge,
}

impl MergeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeMode::Append => "append",
            MergeMode::AppendNoDuplicates => "append_no_duplicates",
            MergeMode::SoftMerge => "soft_merge",
            MergeMode::HardMerge => "hard_merge",
        }
    }
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(MergeMode::Append),
            "append_no_duplicates" => Ok(MergeMode::AppendNoDuplicates),
            "soft_merge" => Ok(MergeMode::SoftMerge),
            "hard_merge" => Ok(MergeMode::HardMerge),
            _ => Err(ConfigError::InvalidMergeMode(s.to_string())),
        }
    }
}

/// Key column to use for `table`: `key` when given, else its first column.
fn resolve_key<'a>(table: &'a Table, key: Option<&'a str>, role: &str) -> Result<&'a str> {
    match key {
        Some(key) => Ok(key),
        None => table
            .column_names()
            .first()
            .copied()
            .ok_or_else(|| SyncError::ParameterNotFound(role.to_string())),
    }
}

/// Combine two tables according to `mode`.
///
/// Keys default to each table's first column.
pub fn combine(
    left: &Table,
    right: &Table,
    mode: MergeMode,
    left_key: Option<&str>,
    right_key: Option<&str>,
) -> Result<Table> {
    let left_key = resolve_key(left, left_key, "left_key")?;
    let right_key = resolve_key(right, right_key, "right_key")?;

    let combined = match mode {
        MergeMode::Append => append(left, right, left_key, right_key, false)?,
        MergeMode::AppendNoDuplicates => append(left, right, left_key, right_key, true)?,
        MergeMode::SoftMerge => merge(left, right, left_key, right_key, MergeOptions::default())?,
        MergeMode::HardMerge => merge(
            left,
            right,
            left_key,
            right_key,
            MergeOptions::default().with_overwrite(true),
        )?,
    };

    tracing::debug!(%mode, left_key, right_key, records = combined.len(), "combined tables");
    Ok(combined)
}

/// Read every record of a source, `batch_size` records at a time.
pub async fn read_all<R: SourceReader>(
    reader: &R,
    batch_size: usize,
    mapping: Option<&DataMap>,
) -> Result<Table> {
    let batch_size = batch_size.max(1);
    let mut cursor = None;
    let mut table: Option<Table> = None;

    loop {
        let batch = reader.read_records(Some(batch_size), cursor, mapping).await?;
        table = Some(match table.take() {
            Some(mut acc) => {
                acc.extend_from(&batch.table);
                acc
            }
            None => batch.table,
        });
        match batch.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    Ok(table.unwrap_or_default())
}

/// Create the table in a source and write every record of `table` into it.
pub async fn write_all<W: SourceWriter>(
    writer: &W,
    table: &Table,
    batch_size: usize,
) -> Result<TableSpec> {
    let batch_size = batch_size.max(1);
    let spec = writer.create_table(table).await?;

    let mut cursor = Some(Cursor::start());
    while let Some(at) = cursor {
        cursor = writer.write_records(table, Some(batch_size), Some(at)).await?;
    }
    Ok(spec)
}

/// Outcome of [`sync_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    pub left_records: usize,
    pub right_records: usize,
    pub written_records: usize,
    pub output: TableSpec,
}

/// Read two files, combine them under `config` and write the result.
///
/// File kinds come from the extensions. The configured format applies to
/// text sources.
pub async fn sync_files(
    config: &Config,
    left: &Path,
    right: &Path,
    output: &Path,
) -> Result<SyncSummary> {
    let left_source = Source::open(&TableSpec::file(left)?.with_format(&config.format))?;
    let right_source = Source::open(&TableSpec::file(right)?.with_format(&config.format))?;
    let output_source = Source::open(&TableSpec::file(output)?.with_format(&config.format))?;

    let left_table = read_all(&left_source, config.batch_size, None).await?;
    tracing::info!(path = %left.display(), records = left_table.len(), "read left table");
    let right_table = read_all(&right_source, config.batch_size, None).await?;
    tracing::info!(path = %right.display(), records = right_table.len(), "read right table");

    let combined = combine(
        &left_table,
        &right_table,
        config.merge_mode,
        config.left_key.as_deref(),
        config.right_key.as_deref(),
    )?;

    let spec = write_all(&output_source, &combined, config.batch_size).await?;
    tracing::info!(
        path = %output.display(),
        mode = %config.merge_mode,
        records = combined.len(),
        "sync complete"
    );

    Ok(SyncSummary {
        left_records: left_table.len(),
        right_records: right_table.len(),
        written_records: combined.len(),
        output: spec,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablesync_engine::{Column, Value};

    fn table(rows: &[(&str, Option<&str>)]) -> Table {
        let mut table = Table::new(vec![Column::text("id"), Column::text("body")]).unwrap();
        for (id, body) in rows {
            table.add_record([("id", Value::from(*id)), ("body", Value::from(*body))]);
        }
        table
    }

    #[test]
    fn parses_modes() {
        for mode in [
            MergeMode::Append,
            MergeMode::AppendNoDuplicates,
            MergeMode::SoftMerge,
            MergeMode::HardMerge,
        ] {
            assert_eq!(mode.as_str().parse::<MergeMode>().unwrap(), mode);
        }
        assert_eq!(" Hard_Merge ".parse::<MergeMode>().unwrap(), MergeMode::HardMerge);
        assert!("merge".parse::<MergeMode>().is_err());
    }

    #[test]
    fn modes_map_onto_operators() {
        let left = table(&[("1", Some("left")), ("2", None)]);
        let right = table(&[("2", Some("right")), ("3", Some("right"))]);

        let soft = combine(&left, &right, MergeMode::SoftMerge, None, None).unwrap();
        assert_eq!(soft.len(), 3);
        assert_eq!(soft.value(0, "body").unwrap(), Some(&Value::from("right")));

        let hard = combine(&right, &left, MergeMode::HardMerge, None, None).unwrap();
        assert_eq!(hard.value(0, "id").unwrap(), Some(&Value::from("2")));
        assert_eq!(hard.value(0, "body").unwrap(), Some(&Value::Null));

        let appended = combine(&left, &right, MergeMode::Append, None, None).unwrap();
        assert_eq!(appended.len(), 4);

        let deduped = combine(&left, &right, MergeMode::AppendNoDuplicates, Some("id"), Some("id")).unwrap();
        assert_eq!(deduped.len(), 3);
    }

    #[test]
    fn keyless_table_needs_a_key() {
        let empty = Table::default();
        let right = table(&[]);
        assert!(matches!(
            combine(&empty, &right, MergeMode::SoftMerge, None, None),
            Err(SyncError::ParameterNotFound(role)) if role == "left_key"
        ));
    }
}
