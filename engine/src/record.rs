//! Record types for storing row data.
//!
//! A [`Record`] is only a slot-indexed value array. It never stores column
//! names; names resolve through the owning table's [`ColumnRegistry`], so
//! schema changes reach every record without rewriting them. The borrowed
//! views [`RecordRef`] and [`RecordMut`] pair a record with that registry.

use crate::{error::Result, registry::Slot, ColumnRegistry, Value};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// One row of field values, indexed by column slot.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: Vec<Value>,
}

impl Record {
    /// A record with `slots` null fields.
    pub(crate) fn with_slots(slots: usize) -> Self {
        Self {
            fields: vec![Value::Null; slots],
        }
    }

    pub(crate) fn field(&self, slot: Slot) -> &Value {
        &self.fields[slot]
    }

    /// Overwrite a slot, growing storage if the slot is fresh.
    pub(crate) fn set_field(&mut self, slot: Slot, value: Value) {
        if slot >= self.fields.len() {
            self.fields.resize(slot + 1, Value::Null);
        }
        self.fields[slot] = value;
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.fields.len()
    }
}

/// A record viewed through its table's schema.
#[derive(Debug, Clone, Copy)]
pub struct RecordRef<'a> {
    registry: &'a ColumnRegistry,
    record: &'a Record,
}

impl<'a> RecordRef<'a> {
    pub(crate) fn new(registry: &'a ColumnRegistry, record: &'a Record) -> Self {
        Self { registry, record }
    }

    /// Value of a column by name.
    pub fn get(&self, name: &str) -> Result<&'a Value> {
        let slot = self.registry.slot(name)?;
        Ok(self.record.field(slot))
    }

    /// Whether the record's schema has a column with this name.
    pub fn has(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Column names visible on this record, in column order.
    pub fn names(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.registry.names()
    }

    /// (name, value) pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        let record = self.record;
        self.registry
            .entries()
            .map(move |(slot, column)| (column.name.as_str(), record.field(slot)))
    }

    /// Plain name → value map of the record's live fields.
    pub fn to_map(&self) -> BTreeMap<String, Value> {
        self.iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    /// Plain JSON object of the record's live fields, in column order.
    pub fn to_json(&self) -> serde_json::Map<String, serde_json::Value> {
        self.iter()
            .map(|(name, value)| (name.to_string(), value.to_json()))
            .collect()
    }

    /// Number of live fields.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

/// Equality over the union of both records' column names: a name present on
/// only one side makes the records unequal; otherwise every shared field must
/// compare equal.
impl PartialEq for RecordRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|(name, value)| match other.get(name) {
            Ok(theirs) => value == theirs,
            Err(_) => false,
        })
    }
}

impl Serialize for RecordRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A mutable record viewed through its table's schema.
#[derive(Debug)]
pub struct RecordMut<'a> {
    registry: &'a ColumnRegistry,
    record: &'a mut Record,
}

impl<'a> RecordMut<'a> {
    pub(crate) fn new(registry: &'a ColumnRegistry, record: &'a mut Record) -> Self {
        Self { registry, record }
    }

    pub fn get(&self, name: &str) -> Result<&Value> {
        let slot = self.registry.slot(name)?;
        Ok(self.record.field(slot))
    }

    /// Overwrite a field by column name. The value is stored as given; it is
    /// not checked against the column's declared kind.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let slot = self.registry.slot(name)?;
        self.record.set_field(slot, value.into());
        Ok(())
    }

    /// Read-only view of the same record.
    pub fn view(&self) -> RecordRef<'_> {
        RecordRef::new(self.registry, self.record)
    }
}
