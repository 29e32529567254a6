//! Defensive field extraction from [`RawRecord`](crate::page::RawRecord) maps.
//!
//! Every accessor returns a typed default instead of failing when a field is
//! absent or has an unexpected shape.

use serde_json::{Map, Value};

/// Scalar coerced to a string: strings as-is, numbers and booleans printed.
/// Null, arrays and objects yield `None`.
pub fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Like [`text`], trimmed, with blank values mapped to `None`.
pub fn trimmed(value: Option<&Value>) -> Option<String> {
    text(value)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn string(map: &Map<String, Value>, key: &str) -> Option<String> {
    trimmed(map.get(key))
}

pub fn array<'a>(map: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    map.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub fn object<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    map.get(key).and_then(Value::as_object)
}

pub fn unsigned(map: &Map<String, Value>, key: &str) -> Option<u64> {
    map.get(key).and_then(Value::as_u64)
}

/// Non-blank strings from an array field, in order.
pub fn strings(map: &Map<String, Value>, key: &str) -> Vec<String> {
    array(map, key)
        .iter()
        .filter_map(|v| trimmed(Some(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn scalars_are_coerced() {
        let m = map(json!({"a": " x ", "b": 12, "c": true, "d": null, "e": [1], "f": "  "}));
        assert_eq!(string(&m, "a").as_deref(), Some("x"));
        assert_eq!(string(&m, "b").as_deref(), Some("12"));
        assert_eq!(string(&m, "c").as_deref(), Some("true"));
        assert_eq!(string(&m, "d"), None);
        assert_eq!(string(&m, "e"), None);
        assert_eq!(string(&m, "f"), None);
        assert_eq!(string(&m, "missing"), None);
    }

    #[test]
    fn wrong_shapes_fall_back_to_defaults() {
        let m = map(json!({"list": "not a list", "obj": [1, 2], "n": -3}));
        assert!(array(&m, "list").is_empty());
        assert!(object(&m, "obj").is_none());
        assert_eq!(unsigned(&m, "n"), None);
        assert!(strings(&m, "missing").is_empty());
    }

    #[test]
    fn strings_skip_blanks_and_non_scalars() {
        let m = map(json!({"tags": ["a", " ", {"x": 1}, " b "]}));
        assert_eq!(strings(&m, "tags"), vec!["a".to_string(), "b".to_string()]);
    }
}
