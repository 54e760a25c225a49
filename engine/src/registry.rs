//! Column registry: name → slot bookkeeping for a table.
//!
//! Every column occupies a storage slot. Records store their values by slot,
//! so renaming a column never touches record storage. Dropping a column
//! frees its slot onto a recycle stack; the next added column takes the most
//! recently freed slot before a fresh one is allocated.

use crate::{error::Result, Column, ColumnKind, Error};
use std::collections::HashMap;

/// Slot index backing a column.
pub type Slot = usize;

/// Where a newly added column landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAssignment {
    /// A slot past the end of current storage
    Fresh(Slot),
    /// A previously freed slot
    Recycled(Slot),
}

impl SlotAssignment {
    pub fn slot(self) -> Slot {
        match self {
            SlotAssignment::Fresh(slot) | SlotAssignment::Recycled(slot) => slot,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnRegistry {
    /// Column definitions by slot; `None` marks a freed slot
    slots: Vec<Option<Column>>,
    /// Live name → slot map
    names: HashMap<String, Slot>,
    /// Live slots in column order
    order: Vec<Slot>,
    /// Freed slots, most recent last
    free: Vec<Slot>,
}

impl ColumnRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a column list, in order.
    pub fn from_columns(columns: impl IntoIterator<Item = Column>) -> Result<Self> {
        let mut registry = Self::new();
        for column in columns {
            registry.add(column)?;
        }
        Ok(registry)
    }

    /// Register a column. Fails if the name is taken.
    pub fn add(&mut self, column: Column) -> Result<SlotAssignment> {
        if self.names.contains_key(&column.name) {
            return Err(Error::ColumnAlreadyExists(column.name));
        }

        let assignment = match self.free.pop() {
            Some(slot) => SlotAssignment::Recycled(slot),
            None => {
                self.slots.push(None);
                SlotAssignment::Fresh(self.slots.len() - 1)
            }
        };

        let slot = assignment.slot();
        self.names.insert(column.name.clone(), slot);
        self.order.push(slot);
        self.slots[slot] = Some(column);
        Ok(assignment)
    }

    /// Unregister a column and free its slot.
    pub fn drop_column(&mut self, name: &str) -> Result<Column> {
        let slot = self
            .names
            .remove(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))?;
        self.order.retain(|s| *s != slot);
        self.free.push(slot);
        self.slots[slot]
            .take()
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// Rename a column, keeping its slot and position.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        let slot = self.slot(old)?;
        if old == new {
            return Ok(());
        }
        if self.names.contains_key(new) {
            return Err(Error::ColumnAlreadyExists(new.to_string()));
        }
        self.names.remove(old);
        self.names.insert(new.to_string(), slot);
        if let Some(column) = self.slots[slot].as_mut() {
            column.name = new.to_string();
        }
        Ok(())
    }

    /// Change the declared kind of a column.
    pub fn set_kind(&mut self, name: &str, kind: ColumnKind) -> Result<()> {
        let slot = self.slot(name)?;
        if let Some(column) = self.slots[slot].as_mut() {
            column.kind = kind;
        }
        Ok(())
    }

    /// Slot backing a column name.
    pub fn slot(&self, name: &str) -> Result<Slot> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// Column definition by name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        let slot = self.slot(name)?;
        self.slots[slot]
            .as_ref()
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Live columns in column order.
    pub fn columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.order.iter().filter_map(|slot| self.slots[*slot].as_ref())
    }

    /// Live columns with their slots, in column order.
    pub fn entries(&self) -> impl Iterator<Item = (Slot, &Column)> + '_ {
        self.order
            .iter()
            .filter_map(|slot| self.slots[*slot].as_ref().map(|c| (*slot, c)))
    }

    /// Live column names in column order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns().map(|c| c.name.as_str())
    }

    /// Number of live columns.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of storage slots, live or freed. Every record holds this many
    /// fields.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Freed slots awaiting reuse, most recent last.
    pub fn free_slots(&self) -> &[Slot] {
        &self.free
    }
}
