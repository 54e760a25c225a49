//! Type conversion between column kinds.
//!
//! The supported directions form a fixed matrix:
//!
//! | from        | to          | rule                          |
//! |-------------|-------------|-------------------------------|
//! | Text        | Date        | parse with `time_format`      |
//! | Text        | Select      | identity                      |
//! | Text        | MultiSelect | split on the delimiter        |
//! | Date        | Text        | render with `time_format`     |
//! | Select      | Text        | identity                      |
//! | MultiSelect | Text        | join with the delimiter       |
//!
//! Every other pair, including a kind to itself, is unsupported and yields
//! [`Error::TypeIncompatible`]. Failures on a supported pair yield
//! [`Error::CannotConvert`]; nothing in here panics on user data.

use crate::{error::Result, ColumnKind, Error, Format, Value};
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt::Write;

/// Whether a conversion from `from` to `to` exists.
pub fn is_convertible(from: ColumnKind, to: ColumnKind) -> bool {
    use ColumnKind::*;
    matches!(
        (from, to),
        (Text, Date) | (Text, Select) | (Text, MultiSelect) | (Date, Text) | (Select, Text)
            | (MultiSelect, Text)
    )
}

/// Fail with [`Error::TypeIncompatible`] unless the pair is supported.
pub fn check_convertible(from: ColumnKind, to: ColumnKind) -> Result<()> {
    if is_convertible(from, to) {
        Ok(())
    } else {
        Err(Error::TypeIncompatible { from, to })
    }
}

/// Convert a value declared as `from` into its `to` representation.
///
/// Null converts to null for every supported pair. A value already in the
/// destination shape passes through unchanged.
pub fn convert(value: &Value, from: ColumnKind, to: ColumnKind, format: &Format) -> Result<Value> {
    use ColumnKind::*;
    check_convertible(from, to)?;

    if value.is_null() {
        return Ok(Value::Null);
    }

    let cannot = |reason: String| Error::CannotConvert { from, to, reason };

    match (from, to, value) {
        (Text, Date, Value::Text(s)) => parse_date(s, &format.time_format)
            .map(Value::Date)
            .ok_or_else(|| {
                cannot(format!(
                    "'{}' does not match time format '{}'",
                    s, format.time_format
                ))
            }),
        (Text, Date, Value::Date(d)) => Ok(Value::Date(*d)),

        (Text, Select, Value::Text(s)) | (Select, Text, Value::Text(s)) => {
            Ok(Value::Text(s.clone()))
        }

        (Text, MultiSelect, Value::Text(s)) => {
            Ok(Value::List(split_tags(s, &format.multiselect_delimiter)))
        }
        (Text, MultiSelect, Value::List(items)) => Ok(Value::List(items.clone())),

        (Date, Text, Value::Date(d)) => render_date(d, &format.time_format)
            .map(Value::Text)
            .ok_or_else(|| cannot(format!("invalid time format '{}'", format.time_format))),
        (Date, Text, Value::Text(s)) => Ok(Value::Text(s.clone())),

        (MultiSelect, Text, Value::List(items)) => {
            Ok(Value::Text(items.join(&format.multiselect_delimiter)))
        }
        (MultiSelect, Text, Value::Text(s)) => Ok(Value::Text(s.clone())),

        (_, _, other) => Err(cannot(format!(
            "unexpected {} value in a {} column",
            other.variant_name(),
            from
        ))),
    }
}

/// Parse a timestamp. Patterns without time fields parse to midnight.
fn parse_date(s: &str, pattern: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, pattern)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, pattern)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Render a timestamp, returning `None` for patterns chrono rejects.
fn render_date(d: &NaiveDateTime, pattern: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", d.format(pattern)).ok()?;
    Some(out)
}

fn split_tags(s: &str, delimiter: &str) -> Vec<String> {
    if s.is_empty() {
        return Vec::new();
    }
    if delimiter.is_empty() {
        return vec![s.to_string()];
    }
    s.split(delimiter).map(str::to_string).collect()
}
