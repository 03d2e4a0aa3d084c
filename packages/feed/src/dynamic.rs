//! Safe navigation over loosely-typed upstream payloads.
//!
//! Both the XML-derived tree and `ReliefWeb` JSON are held as
//! [`serde_json::Value`]. These helpers never panic on unexpected shapes;
//! a missing or mistyped step yields `None` (or an empty list).

use serde_json::Value;

/// Follows `path` through nested objects.
#[must_use]
pub fn get_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

/// Returns `value` unless it is `null`.
#[must_use]
pub const fn non_null(value: Option<&Value>) -> Option<&Value> {
    match value {
        Some(Value::Null) | None => None,
        Some(v) => Some(v),
    }
}

/// The text payload of an element.
///
/// An element with attributes is an object whose text lives under
/// `#text`; such an object without text yields `null`. Any other value is
/// returned as is.
#[must_use]
pub fn text_payload(value: &Value) -> Value {
    match value {
        Value::Object(map) => map.get("#text").cloned().unwrap_or(Value::Null),
        other => other.clone(),
    }
}

/// Renders a scalar (or an element's `#text`) as a string.
#[must_use]
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => map.get("#text").and_then(as_text),
        Value::Null | Value::Array(_) => None,
    }
}

/// Coerces a repeated-or-single element into a list.
///
/// XML-derived trees only use an array when an element repeats, so a
/// single child arrives as a bare value.
#[must_use]
pub fn into_list(value: Option<&Value>) -> Vec<&Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single) => vec![single],
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn get_path_walks_objects() {
        let v = json!({"rss": {"channel": {"title": "GDACS"}}});
        assert_eq!(
            get_path(&v, &["rss", "channel", "title"]),
            Some(&json!("GDACS"))
        );
        assert_eq!(get_path(&v, &["rss", "missing"]), None);
        assert_eq!(get_path(&json!("scalar"), &["rss"]), None);
    }

    #[test]
    fn text_payload_unwraps_attributed_elements() {
        assert_eq!(
            text_payload(&json!({"@isPermaLink": "false", "#text": "EQ1"})),
            json!("EQ1")
        );
        assert_eq!(text_payload(&json!({"@value": "3"})), Value::Null);
        assert_eq!(text_payload(&json!("plain")), json!("plain"));
    }

    #[test]
    fn as_text_handles_scalars() {
        assert_eq!(as_text(&json!(4.5)).as_deref(), Some("4.5"));
        assert_eq!(as_text(&json!({"#text": "x"})).as_deref(), Some("x"));
        assert_eq!(as_text(&Value::Null), None);
    }

    #[test]
    fn into_list_coerces_single_items() {
        assert_eq!(into_list(Some(&json!({"a": 1}))).len(), 1);
        assert_eq!(into_list(Some(&json!([1, 2, 3]))).len(), 3);
        assert!(into_list(Some(&Value::Null)).is_empty());
        assert!(into_list(None).is_empty());
    }
}
