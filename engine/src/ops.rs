//! Relational operators over two tables.
//!
//! All operators are non-mutating: they read both inputs and build a new
//! [`Table`]. Records are matched through a [`KeyIndex`] on each side, so a
//! key shared by several records forms a bucket rather than overwriting.

use crate::{
    error::Result, record::RecordRef, Column, ColumnName, Error, KeyIndex, Table, Value,
};
use std::collections::BTreeMap;

/// Join flags and conflict policy for [`merge`].
///
/// The default is a full outer join where the left side wins on non-null
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Take the right value on shared columns even when the left is non-null
    pub overwrite: bool,
    /// Keep records whose key only appears on the left
    pub left_join: bool,
    /// Keep records whose key only appears on the right
    pub right_join: bool,
    /// Merge records whose key appears on both sides
    pub inner_join: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            left_join: true,
            right_join: true,
            inner_join: true,
        }
    }
}

impl MergeOptions {
    /// Full outer join, left wins.
    pub fn outer() -> Self {
        Self::default()
    }

    /// Only keys present on both sides.
    pub fn inner() -> Self {
        Self {
            left_join: false,
            right_join: false,
            ..Self::default()
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_left_join(mut self, left_join: bool) -> Self {
        self.left_join = left_join;
        self
    }

    pub fn with_right_join(mut self, right_join: bool) -> Self {
        self.right_join = right_join;
        self
    }

    pub fn with_inner_join(mut self, inner_join: bool) -> Self {
        self.inner_join = inner_join;
        self
    }
}

/// Whether both tables have the same column names with equal definitions.
pub fn have_same_columns(left: &Table, right: &Table) -> bool {
    left.column_count() == right.column_count()
        && left
            .columns()
            .all(|column| right.column(&column.name).is_ok_and(|theirs| theirs == column))
}

/// Empty table holding the output columns of a join.
///
/// Left columns come first, in left order: shared columns always (each
/// required to have the same kind on both sides), left-only columns if
/// `left_join`. Right-only columns follow if `right_join`. With every flag off the result has no columns.
/// The result uses the left table's format.
pub fn combine_columns(
    left: &Table,
    right: &Table,
    left_join: bool,
    right_join: bool,
    inner_join: bool,
) -> Result<Table> {
    if !(left_join || right_join || inner_join) {
        return Table::with_format(Vec::new(), left.format().clone());
    }

    let mut columns: Vec<Column> = Vec::new();
    for column in left.columns() {
        match right.column(&column.name) {
            Ok(theirs) if theirs.kind != column.kind => {
                return Err(Error::ColumnTypeIncompatible {
                    column: column.name.clone(),
                    left: column.kind,
                    right: theirs.kind,
                });
            }
            Ok(_) => columns.push(column.clone()),
            Err(_) if left_join => columns.push(column.clone()),
            Err(_) => {}
        }
    }
    if right_join {
        columns.extend(
            right
                .columns()
                .filter(|c| !left.has_column(&c.name))
                .cloned(),
        );
    }

    Table::with_format(columns, left.format().clone())
}

/// Merge a single value pair on a shared column.
///
/// Left wins unless it is null or `overwrite` is set; with `overwrite` the
/// right value wins even when it is null.
pub fn merge_values(left: &Value, right: &Value, overwrite: bool) -> Value {
    if left.is_null() || overwrite {
        right.clone()
    } else {
        left.clone()
    }
}

/// Merge two records field by field over the union of their columns.
///
/// Shared columns follow [`merge_values`]; one-sided columns keep that
/// side's value.
pub fn merge_records(
    left: RecordRef<'_>,
    right: RecordRef<'_>,
    overwrite: bool,
) -> BTreeMap<ColumnName, Value> {
    let mut merged: BTreeMap<ColumnName, Value> = right
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect();
    for (name, value) in left.iter() {
        let out = match right.get(name) {
            Ok(theirs) => merge_values(value, theirs, overwrite),
            Err(_) => value.clone(),
        };
        merged.insert(name.to_string(), out);
    }
    merged
}

/// Join two tables on key columns.
///
/// Output columns come from [`combine_columns`]. Records are emitted in
/// three passes over first-seen key order: keys on both sides (the full
/// cross product of the two buckets, each pair merged), then left-only keys,
/// then right-only keys. Columns a record lacks are null.
pub fn merge(
    left: &Table,
    right: &Table,
    left_key: &str,
    right_key: &str,
    options: MergeOptions,
) -> Result<Table> {
    let mut out = combine_columns(
        left,
        right,
        options.left_join,
        options.right_join,
        options.inner_join,
    )?;
    let left_index = KeyIndex::build(left, left_key)?;
    let right_index = KeyIndex::build(right, right_key)?;

    let (mut merged, mut left_only, mut right_only) = (0usize, 0usize, 0usize);

    if options.inner_join {
        for (key, left_rows) in left_index.iter() {
            let Some(right_rows) = right_index.get(key) else {
                continue;
            };
            for &l in left_rows {
                for &r in right_rows {
                    let (Some(lrec), Some(rrec)) = (left.record(l), right.record(r)) else {
                        continue;
                    };
                    out.add_record(merge_records(lrec, rrec, options.overwrite));
                    merged += 1;
                }
            }
        }
    }

    if options.left_join {
        for (key, rows) in left_index.iter() {
            if right_index.contains(key) {
                continue;
            }
            for record in rows.iter().filter_map(|&row| left.record(row)) {
                out.add_record_from(record);
                left_only += 1;
            }
        }
    }

    if options.right_join {
        for (key, rows) in right_index.iter() {
            if left_index.contains(key) {
                continue;
            }
            for record in rows.iter().filter_map(|&row| right.record(row)) {
                out.add_record_from(record);
                right_only += 1;
            }
        }
    }

    tracing::debug!(
        left_key,
        right_key,
        merged,
        left_only,
        right_only,
        overwrite = options.overwrite,
        "merged tables"
    );
    Ok(out)
}

/// Append the left table's records onto the right table's.
///
/// The output has the right table's columns and format and contains every
/// right record. For each left key, in first-seen order:
///
/// - absent from the right: the whole left bucket is added, or only its
///   first record when `ignore_duplicates` is set;
/// - present on the right: the whole left bucket is added unless
///   `ignore_duplicates` is set, in which case it is skipped.
///
/// Columns present in both tables must have the same kind.
pub fn append(
    left: &Table,
    right: &Table,
    left_key: &str,
    right_key: &str,
    ignore_duplicates: bool,
) -> Result<Table> {
    for column in right.columns() {
        if let Ok(theirs) = left.column(&column.name) {
            if theirs.kind != column.kind {
                return Err(Error::ColumnTypeIncompatible {
                    column: column.name.clone(),
                    left: theirs.kind,
                    right: column.kind,
                });
            }
        }
    }

    let left_index = KeyIndex::build(left, left_key)?;
    let right_index = KeyIndex::build(right, right_key)?;

    let mut out = Table::with_format(right.columns().cloned(), right.format().clone())?;
    out.extend_from(right);

    let mut added = 0usize;
    for (key, rows) in left_index.iter() {
        let collides = right_index.contains(key);
        let take = match (collides, ignore_duplicates) {
            (true, true) => 0,
            (false, true) => 1,
            (_, false) => rows.len(),
        };
        for record in rows.iter().take(take).filter_map(|&row| left.record(row)) {
            out.add_record_from(record);
            added += 1;
        }
    }

    tracing::debug!(
        left_key,
        right_key,
        right_rows = right.len(),
        added,
        ignore_duplicates,
        "appended tables"
    );
    Ok(out)
}
