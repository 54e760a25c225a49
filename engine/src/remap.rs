//! Column remapping.
//!
//! A [`DataMap`] describes a target schema in terms of a source table: for
//! each source column, the column it should become. [`remap`] applies it to a
//! copy of the table, dropping unmapped columns, retyping and renaming the
//! rest.

use crate::{
    error::Result, Column, ColumnName, Error, Format, OpReport, Remapped, Table,
};
use std::collections::HashSet;

/// Target schema for [`remap`]: source column name → target column, plus the
/// format used for the conversions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataMap {
    entries: Vec<(ColumnName, Column)>,
    pub format: Format,
}

impl DataMap {
    pub fn new(format: Format) -> Self {
        Self {
            entries: Vec::new(),
            format,
        }
    }

    /// Map `source` onto `target`. A later mapping of the same source
    /// replaces the earlier one.
    pub fn insert(&mut self, source: impl Into<ColumnName>, target: Column) -> &mut Self {
        let source = source.into();
        match self.entries.iter_mut().find(|(name, _)| *name == source) {
            Some(entry) => entry.1 = target,
            None => self.entries.push((source, target)),
        }
        self
    }

    /// Builder-style [`DataMap::insert`].
    pub fn with_column(mut self, source: impl Into<ColumnName>, target: Column) -> Self {
        self.insert(source, target);
        self
    }

    pub fn get(&self, source: &str) -> Option<&Column> {
        self.entries
            .iter()
            .find(|(name, _)| name == source)
            .map(|(_, column)| column)
    }

    /// Source column names, in mapping order.
    pub fn sources(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// (source, target) pairs, in mapping order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> + '_ {
        self.entries.iter().map(|(name, column)| (name.as_str(), column))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Apply `map` to a copy of `table`.
///
/// 1. Columns without a mapping are dropped.
/// 2. Mappings whose source column does not exist are reported in
///    `missing_sources`; they are not an error.
/// 3. Columns whose kind differs from the target are converted in place,
///    under the map's format.
/// 4. Columns whose name differs from the target are renamed.
///
/// Two mappings onto the same target name fail with
/// [`Error::ColumnAlreadyExists`]. Renames that swap names are allowed.
pub fn remap(table: &Table, map: &DataMap) -> Result<OpReport<Remapped>> {
    check_targets(map)?;

    let mut data = table.clone();
    data.set_format(map.format.clone());

    let unmapped: Vec<ColumnName> = data
        .column_names()
        .into_iter()
        .filter(|name| map.get(name).is_none())
        .map(str::to_string)
        .collect();
    for name in &unmapped {
        data.drop_column(name)?;
    }

    let mut missing_sources = Vec::new();
    let mut present = Vec::new();
    for (source, target) in map.iter() {
        if data.has_column(source) {
            present.push((source, target));
        } else {
            tracing::warn!(column = source, "remap source column not found");
            missing_sources.push(source.to_string());
        }
    }

    let mut type_change_results = Vec::new();
    let mut errors = 0;
    for (source, target) in &present {
        if data.column(source)?.kind != target.kind {
            let report = data.change_column_type(source, target.kind, None, true)?;
            errors += report.non_critical_errors;
            type_change_results.push(report);
        }
    }

    let renames: Vec<(&str, &str)> = present
        .iter()
        .filter(|(source, target)| *source != target.name)
        .map(|(source, target)| (*source, target.name.as_str()))
        .collect();
    rename_all(&mut data, &renames)?;

    tracing::debug!(
        dropped = unmapped.len(),
        retyped = type_change_results.len(),
        renamed = renames.len(),
        missing = missing_sources.len(),
        "remapped table"
    );

    Ok(OpReport::new(
        Remapped {
            remapped_data: data,
            type_change_results,
            missing_sources,
        },
        errors,
    ))
}

impl Table {
    /// Apply a [`DataMap`] to a copy of this table. See [`remap`].
    pub fn remap(&self, map: &DataMap) -> Result<OpReport<Remapped>> {
        remap(self, map)
    }
}

fn check_targets(map: &DataMap) -> Result<()> {
    let mut seen = HashSet::new();
    for (_, target) in map.iter() {
        if !seen.insert(target.name.as_str()) {
            return Err(Error::ColumnAlreadyExists(target.name.clone()));
        }
    }
    Ok(())
}

/// Rename a batch of columns. Renames whose target is still held by another
/// column in the batch go through a temporary name first.
fn rename_all(data: &mut Table, renames: &[(&str, &str)]) -> Result<()> {
    let sources: HashSet<&str> = renames.iter().map(|(source, _)| *source).collect();
    let mut deferred = Vec::new();

    for &(source, target) in renames {
        if sources.contains(target) {
            let temp = temporary_name(data, source);
            data.rename_column(source, &temp)?;
            deferred.push((temp, target));
        } else {
            data.rename_column(source, target)?;
        }
    }
    for (temp, target) in deferred {
        data.rename_column(&temp, target)?;
    }
    Ok(())
}

fn temporary_name(data: &Table, source: &str) -> String {
    let mut name = format!("__remap_{source}");
    while data.has_column(&name) {
        name.push('_');
    }
    name
}
