//! Order-independent equivalence between tables.
//!
//! Two tables are equivalent when they have the same columns and there is a
//! bijection between their records pairing structurally equal records.
//!
//! # Algorithm
//!
//! 1. Reject on any column-set mismatch.
//! 2. Without an explicit key, index every non-MultiSelect column on both
//!    sides. A column whose distinct-value count differs between the sides
//!    proves the tables differ. Otherwise the column with the most distinct
//!    values becomes the key, since more buckets mean smaller buckets.
//! 3. For every key, pair each left record of the bucket with an unpaired,
//!    equal right record. Any record left over on either side means the
//!    tables are not equivalent.
//!
//! Pairing is quadratic in the bucket size.

use crate::{error::Result, have_same_columns, ColumnKind, KeyIndex, Table};

impl Table {
    /// Whether `self` and `other` hold the same records, in any order.
    ///
    /// `key_column` skips the key search and buckets on that column; it must
    /// exist in both tables.
    pub fn equivalent_to(&self, other: &Table, key_column: Option<&str>) -> Result<bool> {
        if !have_same_columns(self, other) {
            tracing::debug!("tables differ in columns");
            return Ok(false);
        }
        if self.len() != other.len() {
            return Ok(false);
        }

        let key = match key_column {
            Some(name) => {
                self.column(name)?;
                Some((KeyIndex::build(self, name)?, KeyIndex::build(other, name)?))
            }
            None => match choose_key(self, other)? {
                KeyChoice::Mismatch => return Ok(false),
                KeyChoice::Column(name, left, right) => {
                    tracing::debug!(key = %name, bins = left.bin_count(), "chose equivalence key");
                    Some((left, right))
                }
                KeyChoice::None => None,
            },
        };

        let equivalent = match key {
            Some((left, right)) => buckets_pair(self, other, &left, &right),
            None => {
                let left_rows: Vec<usize> = (0..self.len()).collect();
                let right_rows: Vec<usize> = (0..other.len()).collect();
                pair_rows(self, other, &left_rows, &right_rows)
            }
        };
        Ok(equivalent)
    }
}

enum KeyChoice {
    /// Some column's distinct-value count differs
    Mismatch,
    /// Best key column with both indexes
    Column(String, KeyIndex, KeyIndex),
    /// No indexable column
    None,
}

fn choose_key(left: &Table, right: &Table) -> Result<KeyChoice> {
    let mut best: Option<(String, KeyIndex, KeyIndex)> = None;

    for column in left.columns() {
        if column.kind == ColumnKind::MultiSelect {
            continue;
        }
        let left_index = KeyIndex::build(left, &column.name)?;
        let right_index = KeyIndex::build(right, &column.name)?;
        if left_index.bin_count() != right_index.bin_count() {
            return Ok(KeyChoice::Mismatch);
        }
        let better = best
            .as_ref()
            .map_or(true, |(_, idx, _)| left_index.bin_count() > idx.bin_count());
        if better {
            best = Some((column.name.clone(), left_index, right_index));
        }
    }

    Ok(match best {
        Some((name, left_index, right_index)) => KeyChoice::Column(name, left_index, right_index),
        None => KeyChoice::None,
    })
}

fn buckets_pair(left: &Table, right: &Table, left_index: &KeyIndex, right_index: &KeyIndex) -> bool {
    if left_index.bin_count() != right_index.bin_count() {
        return false;
    }
    left_index.iter().all(|(key, left_rows)| match right_index.get(key) {
        Some(right_rows) => pair_rows(left, right, left_rows, right_rows),
        None => false,
    })
}

/// Perfectly pair two buckets by structural equality.
fn pair_rows(left: &Table, right: &Table, left_rows: &[usize], right_rows: &[usize]) -> bool {
    if left_rows.len() != right_rows.len() {
        return false;
    }
    let mut paired = vec![false; right_rows.len()];
    for &l in left_rows {
        let Some(left_record) = left.record(l) else {
            return false;
        };
        let partner = right_rows.iter().enumerate().position(|(i, &r)| {
            !paired[i] && right.record(r).is_some_and(|rec| rec == left_record)
        });
        match partner {
            Some(i) => paired[i] = true,
            None => return false,
        }
    }
    true
}
