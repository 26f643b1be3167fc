// Copyright (c) 2026 kubetables contributors
// SPDX-License-Identifier: BSD-3-Clause

//! Type mapper: Kubernetes JSON shapes into the engine value model.
//!
//! Every conversion is null-safe. An absent, JSON-null, or mistyped source
//! field yields [`ColumnValue::Null`] — extraction must never fail for a
//! well-formed object.

use chrono::DateTime;
use serde_json::Value;

/// A single cell value, row-oriented. Materialization turns columns of
/// these into Arrow arrays.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Null,
    Text(String),
    Bigint(i64),
    /// Nanoseconds since the Unix epoch, normalized to UTC.
    TimestampTz(i64),
    TextList(Vec<String>),
    TextMap(Vec<(String, String)>),
}

impl ColumnValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }
}

/// A JSON string as text.
pub fn text(value: Option<&Value>) -> ColumnValue {
    match value {
        Some(Value::String(s)) => ColumnValue::Text(s.clone()),
        _ => ColumnValue::Null,
    }
}

/// A JSON integer as a 64-bit signed value.
pub fn bigint(value: Option<&Value>) -> ColumnValue {
    match value.and_then(Value::as_i64) {
        Some(n) => ColumnValue::Bigint(n),
        None => ColumnValue::Null,
    }
}

/// An RFC 3339 timestamp string, normalized to UTC nanoseconds.
///
/// Unparseable or out-of-range timestamps yield null rather than an error;
/// the field was present but carries nothing representable.
pub fn timestamp_tz(value: Option<&Value>) -> ColumnValue {
    let Some(Value::String(raw)) = value else {
        return ColumnValue::Null;
    };
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => match ts.timestamp_nanos_opt() {
            Some(nanos) => ColumnValue::TimestampTz(nanos),
            None => ColumnValue::Null,
        },
        Err(_) => ColumnValue::Null,
    }
}

/// A JSON array of strings. Non-string elements are dropped.
pub fn text_list(value: Option<&Value>) -> ColumnValue {
    match value {
        Some(Value::Array(items)) => ColumnValue::TextList(
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        ),
        _ => ColumnValue::Null,
    }
}

/// A JSON object with string values, in source order.
pub fn text_map(value: Option<&Value>) -> ColumnValue {
    match value {
        Some(Value::Object(entries)) => ColumnValue::TextMap(
            entries
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect(),
        ),
        _ => ColumnValue::Null,
    }
}

/// Any JSON value serialized back to text. Used by the raw passthrough
/// columns.
pub fn json_text(value: Option<&Value>) -> ColumnValue {
    match value {
        None | Some(Value::Null) => ColumnValue::Null,
        Some(v) => match serde_json::to_string(v) {
            Ok(s) => ColumnValue::Text(s),
            Err(_) => ColumnValue::Null,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_of_missing_field_is_null() {
        assert_eq!(text(None), ColumnValue::Null);
        assert_eq!(text(Some(&Value::Null)), ColumnValue::Null);
        assert_eq!(text(Some(&json!(42))), ColumnValue::Null);
    }

    #[test]
    fn timestamp_normalizes_offset_to_utc() {
        let value = json!("2024-01-15T12:30:00+02:00");
        let ColumnValue::TimestampTz(nanos) = timestamp_tz(Some(&value)) else {
            panic!("expected timestamp");
        };
        // 10:30:00 UTC
        assert_eq!(nanos, 1_705_314_600_000_000_000);
    }

    #[test]
    fn timestamp_keeps_nanosecond_precision() {
        let value = json!("2024-01-01T00:00:00.000000123Z");
        assert_eq!(
            timestamp_tz(Some(&value)),
            ColumnValue::TimestampTz(1_704_067_200_000_000_123)
        );
    }

    #[test]
    fn unparseable_timestamp_is_null() {
        assert_eq!(timestamp_tz(Some(&json!("yesterday"))), ColumnValue::Null);
    }

    #[test]
    fn list_and_map_conversions() {
        let list = json!(["a", "b"]);
        assert_eq!(
            text_list(Some(&list)),
            ColumnValue::TextList(vec!["a".to_string(), "b".to_string()])
        );

        let map = json!({"app": "nginx", "tier": "web"});
        assert_eq!(
            text_map(Some(&map)),
            ColumnValue::TextMap(vec![
                ("app".to_string(), "nginx".to_string()),
                ("tier".to_string(), "web".to_string()),
            ])
        );

        assert_eq!(text_list(None), ColumnValue::Null);
        assert_eq!(text_map(None), ColumnValue::Null);
    }

    #[test]
    fn json_text_serializes_nested_values() {
        let value = json!({"phase": "Running"});
        assert_eq!(
            json_text(Some(&value)),
            ColumnValue::Text(r#"{"phase":"Running"}"#.to_string())
        );
        assert_eq!(json_text(Some(&Value::Null)), ColumnValue::Null);
    }
}
