//! Table - the in-memory record set.
//!
//! A [`Table`] owns its [`ColumnRegistry`], its records and the [`Format`]
//! used for text conversions. Records hold only slot-indexed values; every
//! name lookup goes through the registry, so rename and drop are O(1) with
//! respect to the record count.
//!
//! Invariant: every record holds a field for every slot of the registry
//! (absent values are [`Value::Null`], never a missing field). Slots freed
//! by [`Table::drop_column`] keep their stale values until a new column
//! recycles the slot, at which point the default is force-written into every
//! record. [`Table::check_integrity`] verifies the invariant.

use crate::{
    convert,
    error::Result,
    record::{Record, RecordMut, RecordRef},
    registry::{ColumnRegistry, Slot},
    Column, ColumnKind, ColumnName, Error, Format, OpReport, TypeChange, Value, WriteSafe,
};
use std::collections::{HashMap, HashSet};

/// Suffix appended to a column name when a converted copy needs a free name.
pub const COPY_SUFFIX: &str = "_m";

/// Typed, mutable, columnar record set.
#[derive(Debug, Clone, Default)]
pub struct Table {
    registry: ColumnRegistry,
    records: Vec<Record>,
    format: Format,
}

impl Table {
    /// Create an empty table with the default format.
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Result<Self> {
        Self::with_format(columns, Format::default())
    }

    /// Create an empty table with an explicit format.
    pub fn with_format(columns: impl IntoIterator<Item = Column>, format: Format) -> Result<Self> {
        Ok(Self {
            registry: ColumnRegistry::from_columns(columns)?,
            records: Vec::new(),
            format,
        })
    }

    /// Builder-style ingestion of raw records.
    pub fn with_records<R, K, V>(mut self, records: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.add_records(records);
        self
    }

    // ------------------------------------------------------------------
    // Schema
    // ------------------------------------------------------------------

    pub fn format(&self) -> &Format {
        &self.format
    }

    pub fn set_format(&mut self, format: Format) {
        self.format = format;
    }

    pub fn registry(&self) -> &ColumnRegistry {
        &self.registry
    }

    /// Live columns in column order.
    pub fn columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.registry.columns()
    }

    /// Live column names in column order.
    pub fn column_names(&self) -> Vec<&str> {
        self.registry.names().collect()
    }

    pub fn column_count(&self) -> usize {
        self.registry.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.registry.column(name)
    }

    /// Storage slot of a column.
    pub fn column_index(&self, name: &str) -> Result<Slot> {
        self.registry.slot(name)
    }

    /// Add a column, writing `default` into every existing record.
    pub fn add_column(&mut self, column: Column, default: impl Into<Value>) -> Result<()> {
        let slot = self.registry.add(column)?.slot();
        let default = default.into();
        for record in &mut self.records {
            record.set_field(slot, default.clone());
        }
        Ok(())
    }

    /// Drop a column. Record storage is left as is; the slot is recycled.
    pub fn drop_column(&mut self, name: &str) -> Result<Column> {
        self.registry.drop_column(name)
    }

    pub fn rename_column(&mut self, old: &str, new: &str) -> Result<()> {
        self.registry.rename(old, new)
    }

    // ------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------

    /// Ingest one raw record. Keys without a column are ignored; columns
    /// without a key are null. Returns the new row index.
    pub fn add_record<K, V>(&mut self, fields: impl IntoIterator<Item = (K, V)>) -> usize
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut record = Record::with_slots(self.registry.slot_count());
        for (name, value) in fields {
            if let Ok(slot) = self.registry.slot(name.as_ref()) {
                record.set_field(slot, value.into());
            }
        }
        self.records.push(record);
        self.records.len() - 1
    }

    /// Ingest many raw records.
    pub fn add_records<R, K, V>(&mut self, records: impl IntoIterator<Item = R>)
    where
        R: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for fields in records {
            self.add_record(fields);
        }
    }

    /// Copy a record from another table by column name.
    pub fn add_record_from(&mut self, record: RecordRef<'_>) -> usize {
        self.add_record(record.iter().map(|(name, value)| (name, value.clone())))
    }

    /// Copy every record of `other` by column name.
    pub fn extend_from(&mut self, other: &Table) {
        for record in other.records() {
            self.add_record_from(record);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, row: usize) -> Option<RecordRef<'_>> {
        self.records
            .get(row)
            .map(|r| RecordRef::new(&self.registry, r))
    }

    pub fn record_mut(&mut self, row: usize) -> Option<RecordMut<'_>> {
        let registry = &self.registry;
        self.records
            .get_mut(row)
            .map(|r| RecordMut::new(registry, r))
    }

    /// All records, in order.
    pub fn records(&self) -> impl ExactSizeIterator<Item = RecordRef<'_>> + '_ {
        self.records
            .iter()
            .map(move |r| RecordRef::new(&self.registry, r))
    }

    pub(crate) fn raw_records(&self) -> &[Record] {
        &self.records
    }

    /// Read one field.
    pub fn value(&self, row: usize, column: &str) -> Result<Option<&Value>> {
        let slot = self.registry.slot(column)?;
        Ok(self.records.get(row).map(|r| r.field(slot)))
    }

    /// Whether every record covers every registry slot.
    pub fn check_integrity(&self) -> bool {
        let slots = self.registry.slot_count();
        self.records.iter().all(|r| r.slot_count() == slots)
    }

    // ------------------------------------------------------------------
    // Conversion
    // ------------------------------------------------------------------

    /// Convert a single value under this table's format.
    pub fn convert_value(&self, value: &Value, from: ColumnKind, to: ColumnKind) -> Result<Value> {
        convert::convert(value, from, to, &self.format)
    }

    /// Retype a column.
    ///
    /// In place (the default mode) the column keeps its slot, is optionally
    /// renamed, and every value is replaced by its converted form. Otherwise
    /// a new column receives the converted values: `new_name` if it is free,
    /// else `source` suffixed with `_m` until free.
    ///
    /// Values that fail to convert become null and are counted in the
    /// report. Schema errors are returned before anything is modified.
    pub fn change_column_type(
        &mut self,
        source: &str,
        new_kind: ColumnKind,
        new_name: Option<&str>,
        in_place: bool,
    ) -> Result<OpReport<TypeChange>> {
        let column = self.registry.column(source)?.clone();
        convert::check_convertible(column.kind, new_kind)?;

        let target_name = if in_place {
            match new_name {
                Some(name) if name != source && self.registry.contains(name) => {
                    return Err(Error::ColumnAlreadyExists(name.to_string()));
                }
                Some(name) => name.to_string(),
                None => source.to_string(),
            }
        } else {
            match new_name {
                Some(name) if !self.registry.contains(name) => name.to_string(),
                _ => self.free_name(source),
            }
        };

        let slot = self.registry.slot(source)?;
        let (converted, errors) = self.convert_slot(slot, column.kind, new_kind);

        if in_place {
            self.registry.rename(source, &target_name)?;
            self.registry.set_kind(&target_name, new_kind)?;
            for (record, value) in self.records.iter_mut().zip(converted) {
                record.set_field(slot, value);
            }
        } else {
            let new_slot = self
                .registry
                .add(Column::new(new_kind, target_name.clone()))?
                .slot();
            for (record, value) in self.records.iter_mut().zip(converted) {
                record.set_field(new_slot, value);
            }
        }

        if errors > 0 {
            tracing::warn!(
                column = source,
                from = %column.kind,
                to = %new_kind,
                errors,
                "nulled values that could not be converted"
            );
        }
        tracing::debug!(
            column = source,
            new_column = %target_name,
            rows = self.records.len(),
            in_place,
            "changed column type"
        );

        Ok(OpReport::new(
            TypeChange {
                new_column_name: target_name,
            },
            errors,
        ))
    }

    /// Convert every value at `slot`, nulling failures.
    fn convert_slot(&self, slot: Slot, from: ColumnKind, to: ColumnKind) -> (Vec<Value>, usize) {
        let mut errors = 0;
        let converted = self
            .records
            .iter()
            .map(|record| match self.convert_value(record.field(slot), from, to) {
                Ok(value) => value,
                Err(_) => {
                    errors += 1;
                    Value::Null
                }
            })
            .collect();
        (converted, errors)
    }

    fn free_name(&self, source: &str) -> ColumnName {
        let mut name = format!("{source}{COPY_SUFFIX}");
        while self.registry.contains(&name) {
            name.push_str(COPY_SUFFIX);
        }
        name
    }

    /// Deep copy with every column whose kind is a key of `type_map`
    /// converted in place to the mapped kind.
    ///
    /// Used by writers that can only persist plain text. A mapping onto the
    /// column's own kind is a no-op.
    pub fn make_write_safe(
        &self,
        type_map: &HashMap<ColumnKind, ColumnKind>,
    ) -> Result<OpReport<WriteSafe>> {
        let mut safe = self.clone();
        let targets: Vec<(ColumnName, ColumnKind)> = self
            .columns()
            .filter_map(|c| match type_map.get(&c.kind) {
                Some(kind) if *kind != c.kind => Some((c.name.clone(), *kind)),
                _ => None,
            })
            .collect();

        let mut errors = 0;
        let mut converted = Vec::with_capacity(targets.len());
        for (name, kind) in targets {
            let report = safe.change_column_type(&name, kind, None, true)?;
            errors += report.non_critical_errors;
            converted.push(name);
        }

        Ok(OpReport::new(
            WriteSafe {
                converted,
                safe_data: safe,
            },
            errors,
        ))
    }

    // ------------------------------------------------------------------
    // Aggregation
    // ------------------------------------------------------------------

    /// Distinct values per column. List values contribute their elements.
    ///
    /// Computed on every call, O(records × columns).
    pub fn get_uniques(&self) -> HashMap<ColumnName, HashSet<Value>> {
        self.registry
            .entries()
            .map(|(slot, column)| {
                let mut seen = HashSet::new();
                for record in &self.records {
                    match record.field(slot) {
                        Value::List(items) => {
                            seen.extend(items.iter().cloned().map(Value::Text));
                        }
                        other => {
                            seen.insert(other.clone());
                        }
                    }
                }
                (column.name.clone(), seen)
            })
            .collect()
    }
}
