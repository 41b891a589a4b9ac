//! Field-name normalization for backend payloads.
//!
//! The backend answers in camelCase or snake_case depending on the route,
//! sometimes wraps records in `{receipt: …}` / `{data: …}` and sometimes
//! sends numbers as strings. Every entity adapter in [`crate::models`] reads
//! through [`Fields`] so nothing else in the workspace branches on naming.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::error::DecodeError;

/// Return the record inside the first envelope key that holds an object,
/// or the value itself when it is flat.
pub fn unwrap_envelope<'a>(value: &'a Value, keys: &[&str]) -> &'a Value {
    keys.iter()
        .filter_map(|k| value.get(*k))
        .find(|inner| inner.is_object())
        .unwrap_or(value)
}

/// Same as [`unwrap_envelope`] for list payloads; a bare array is accepted.
pub fn unwrap_list<'a>(value: &'a Value, keys: &[&str]) -> &'a [Value] {
    if let Some(items) = value.as_array() {
        return items;
    }
    keys.iter()
        .filter_map(|k| value.get(*k).and_then(Value::as_array))
        .map(Vec::as_slice)
        .next()
        .unwrap_or(&[])
}

/// Read-only view over a JSON object with first-match-wins lookups.
#[derive(Clone, Copy)]
pub struct Fields<'a> {
    obj: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    pub fn new(value: &'a Value) -> Result<Self, DecodeError> {
        value
            .as_object()
            .map(|obj| Self { obj })
            .ok_or(DecodeError::MissingField("object"))
    }

    fn first(&self, keys: &[&str]) -> Option<&'a Value> {
        keys.iter()
            .filter_map(|k| self.obj.get(*k))
            .find(|v| !v.is_null() && v.as_str() != Some(""))
    }

    /// Text under any of `keys`. Numbers are rendered as text.
    pub fn text(&self, keys: &[&str]) -> Option<String> {
        match self.first(keys)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Numeric value; numeric strings such as `"12.50"` are accepted.
    pub fn number(&self, keys: &[&str]) -> Option<f64> {
        match self.first(keys)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn count(&self, keys: &[&str]) -> u64 {
        self.number(keys)
            .filter(|n| n.is_finite() && *n > 0.0)
            .map(|n| n as u64)
            .unwrap_or(0)
    }

    pub fn flag(&self, keys: &[&str]) -> bool {
        match self.first(keys) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
            Some(Value::String(s)) => s == "true" || s == "1",
            _ => false,
        }
    }

    /// RFC 3339 string, naive `YYYY-MM-DD HH:MM:SS` (taken as UTC) or
    /// epoch milliseconds.
    pub fn time(&self, keys: &[&str]) -> Option<DateTime<Utc>> {
        match self.first(keys)? {
            Value::String(s) => parse_time(s),
            Value::Number(n) => n
                .as_i64()
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
            _ => None,
        }
    }

    pub fn nested(&self, keys: &[&str]) -> Option<Fields<'a>> {
        self.first(keys).and_then(|v| Fields::new(v).ok())
    }

    pub fn list(&self, keys: &[&str]) -> &'a [Value] {
        self.first(keys)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Text list; a single comma-separated string is split.
    pub fn text_list(&self, keys: &[&str]) -> Vec<String> {
        match self.first(keys) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_match_wins_and_skips_blank() {
        let v = json!({ "farmName": "", "farm_name": "Oak Hill" });
        let f = Fields::new(&v).unwrap();
        assert_eq!(f.text(&["farmName", "farm_name"]).as_deref(), Some("Oak Hill"));
    }

    #[test]
    fn test_number_from_string() {
        let v = json!({ "amount_paid": "12.50" });
        let f = Fields::new(&v).unwrap();
        assert_eq!(f.number(&["amountPaid", "amount_paid"]), Some(12.5));
    }

    #[test]
    fn test_envelope_variants() {
        let wrapped = json!({ "success": true, "receipt": { "receiptId": "R" } });
        let data = json!({ "data": { "receiptId": "R" } });
        let flat = json!({ "receiptId": "R" });
        for v in [&wrapped, &data, &flat] {
            let inner = unwrap_envelope(v, &["receipt", "data"]);
            assert_eq!(inner["receiptId"], "R");
        }
    }

    #[test]
    fn test_list_envelopes() {
        let bare = json!([{ "batchId": "A" }]);
        let keyed = json!({ "batches": [{ "batchId": "A" }, { "batchId": "B" }] });
        assert_eq!(unwrap_list(&bare, &["batches"]).len(), 1);
        assert_eq!(unwrap_list(&keyed, &["batches", "data"]).len(), 2);
        assert!(unwrap_list(&json!({ "oops": 1 }), &["batches"]).is_empty());
    }

    #[test]
    fn test_time_formats() {
        let v = json!({
            "a": "2026-02-01T10:00:00.000Z",
            "b": "2026-02-01 10:00:00",
            "c": 1_769_940_000_000i64,
            "d": "not a date",
        });
        let f = Fields::new(&v).unwrap();
        let a = f.time(&["a"]).unwrap();
        assert_eq!(f.time(&["b"]), Some(a));
        assert_eq!(f.time(&["c"]), Some(a));
        assert_eq!(f.time(&["d"]), None);
    }

    #[test]
    fn test_text_list_split() {
        let v = json!({ "one": "Organic, Soil Association", "many": ["A", "B"] });
        let f = Fields::new(&v).unwrap();
        assert_eq!(f.text_list(&["one"]), vec!["Organic", "Soil Association"]);
        assert_eq!(f.text_list(&["many"]), vec!["A", "B"]);
    }
}
