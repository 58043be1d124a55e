//! Structured query-string expressions shared by the filter and sort guards.

use serde_json::Value;

/// Reads a structured expression from a decoded query value.
///
/// Objects and arrays are taken as they are; a string must hold a JSON
/// object or array. Anything else is `None`.
pub(crate) fn parse_structured(raw: &Value) -> Option<Value> {
    match raw {
        Value::Object(_) | Value::Array(_) => Some(raw.clone()),
        Value::String(text) => serde_json::from_str::<Value>(text)
            .ok()
            .filter(|parsed| parsed.is_object() || parsed.is_array()),
        _ => None,
    }
}

/// Returns a query value, treating the empty string as absent.
pub(crate) fn lookup<'q>(query: &'q Value, name: &str) -> Option<&'q Value> {
    query.get(name).filter(|value| value.as_str() != Some(""))
}
