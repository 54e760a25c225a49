//! Field values.
//!
//! Values are untyped at the storage layer: a Date column may hold a
//! [`Value::Text`] until it is converted. The owning column's declared kind
//! gives the value its meaning.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

/// Rendering used when a date value is serialized directly, outside of a
/// table format.
pub const ISO_DATETIME: &str = "%Y-%m-%dT%H:%M:%S";

/// A single field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Value {
    #[default]
    Null,
    /// Text, also used for Select values
    Text(String),
    /// Multi-valued tags
    List(Vec<String>),
    /// Timestamp without time zone
    Date(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Name of the variant, for diagnostics.
    pub fn variant_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Text(_) => "Text",
            Value::List(_) => "List",
            Value::Date(_) => "Date",
        }
    }

    /// Convert to a plain JSON value. Dates render as ISO-8601 text.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(|s| serde_json::Value::String(s.clone()))
                    .collect(),
            ),
            Value::Date(d) => serde_json::Value::String(d.format(ISO_DATETIME).to_string()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Text(s) => serializer.serialize_str(s),
            Value::List(items) => items.serialize(serializer),
            Value::Date(d) => serializer.collect_str(&d.format(ISO_DATETIME)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Value::List(items.into_iter().map(str::to_string).collect())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(d: NaiveDateTime) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Raw adapter values. Arrays become lists (non-string elements rendered as
/// JSON text); scalars other than strings become text.
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => Value::List(
                items
                    .into_iter()
                    .map(|item| match item {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            other => Value::Text(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn sample_date() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(1994, 3, 23)
            .unwrap()
            .and_hms_opt(12, 1, 0)
            .unwrap()
    }

    #[test]
    fn from_json_values() {
        assert_eq!(Value::from(json!(null)), Value::Null);
        assert_eq!(Value::from(json!("a")), Value::Text("a".into()));
        assert_eq!(Value::from(json!(["x", "y"])), Value::from(vec!["x", "y"]));
        assert_eq!(Value::from(json!(3)), Value::Text("3".into()));
        assert_eq!(Value::from(json!(true)), Value::Text("true".into()));
        assert_eq!(Value::from(json!([0, 1])), Value::from(vec!["0", "1"]));
    }

    #[test]
    fn option_maps_none_to_null() {
        assert_eq!(Value::from(None::<&str>), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::Text("a".into()));
    }

    #[test]
    fn serialize_values() {
        let values = vec![
            Value::Null,
            Value::from("text"),
            Value::from(vec!["a", "b"]),
            Value::Date(sample_date()),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[null,"text",["a","b"],"1994-03-23T12:01:00"]"#);
    }

    #[test]
    fn to_json_matches_serialize() {
        let value = Value::Date(sample_date());
        assert_eq!(value.to_json(), serde_json::to_value(&value).unwrap());
    }

    #[test]
    fn accessors() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::from("a").as_text(), Some("a"));
        assert_eq!(Value::from("a").as_list(), None);
        assert_eq!(Value::Date(sample_date()).as_date(), Some(sample_date()));
        assert_eq!(Value::from(vec!["a"]).variant_name(), "List");
    }
}
