//! Key indexes over a table column.

use crate::{error::Result, Table, Value};
use std::collections::HashMap;

/// Maps each distinct value of a column to the rows holding it.
///
/// Rows sharing a key form a bucket; nothing is overwritten. Keys keep the
/// order in which they were first seen, so operators built on the index
/// produce deterministic output. Null is an ordinary key.
#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    keys: Vec<Value>,
    buckets: HashMap<Value, Vec<usize>>,
}

impl KeyIndex {
    /// Index `column` of `table`.
    pub fn build(table: &Table, column: &str) -> Result<Self> {
        let slot = table.column_index(column)?;
        let mut index = Self::default();
        for (row, record) in table.raw_records().iter().enumerate() {
            let key = record.field(slot);
            match index.buckets.get_mut(key) {
                Some(bucket) => bucket.push(row),
                None => {
                    index.keys.push(key.clone());
                    index.buckets.insert(key.clone(), vec![row]);
                }
            }
        }
        Ok(index)
    }

    /// Rows holding `key`, in table order.
    pub fn get(&self, key: &Value) -> Option<&[usize]> {
        self.buckets.get(key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: &Value) -> bool {
        self.buckets.contains_key(key)
    }

    /// Distinct keys in first-seen order.
    pub fn keys(&self) -> &[Value] {
        &self.keys
    }

    /// (key, rows) pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &[usize])> + '_ {
        self.keys
            .iter()
            .map(move |k| (k, self.buckets[k].as_slice()))
    }

    /// Number of distinct keys.
    pub fn bin_count(&self) -> usize {
        self.keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Column, Error};
    use serde_json::json;

    #[test]
    fn buckets_duplicate_keys() {
        let mut table = Table::new(vec![Column::text("title"), Column::text("body")]).unwrap();
        table.add_record([("title", json!("a")), ("body", json!("1"))]);
        table.add_record([("title", json!("b")), ("body", json!("2"))]);
        table.add_record([("title", json!("a")), ("body", json!("3"))]);
        table.add_record([("body", json!("4"))]);

        let index = KeyIndex::build(&table, "title").unwrap();
        assert_eq!(index.bin_count(), 3);
        assert_eq!(index.get(&Value::from("a")), Some(&[0, 2][..]));
        assert_eq!(index.get(&Value::from("b")), Some(&[1][..]));
        assert_eq!(index.get(&Value::Null), Some(&[3][..]));
        assert_eq!(
            index.keys(),
            &[Value::from("a"), Value::from("b"), Value::Null]
        );
        assert!(!index.contains(&Value::from("c")));
    }

    #[test]
    fn missing_column() {
        let table = Table::new(vec![Column::text("title")]).unwrap();
        assert_eq!(
            KeyIndex::build(&table, "id").map(|_| ()),
            Err(Error::ColumnNotFound("id".into()))
        );
    }
}
