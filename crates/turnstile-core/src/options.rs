//! Normalized query options.
//!
//! [`QueryOptions`] is the record the query-option guards build up for one
//! request. Each guard merges only its own keys, so a record is additive
//! within a request lifecycle: no guard removes a key another guard set.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pagination, filter, sort and projection derived from a query string.
///
/// Serializes with the wire key names (`where` for the filter).
///
/// # Example
///
/// ```
/// use turnstile_core::QueryOptions;
///
/// let mut options = QueryOptions::default();
/// options.merge_pagination(3, 20);
/// options.merge_select(vec!["id".into(), "name".into()]);
///
/// assert_eq!(options.offset, Some(60));
/// assert_eq!(options.limit, Some(20));
/// assert_eq!(options.index, Some(3));
/// assert_eq!(options.select.as_deref(), Some(&["id".to_string(), "name".to_string()][..]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Number of records to skip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    /// Page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Zero-based page index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    /// Opaque structured filter.
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    /// Opaque structured sort specification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Value>,
    /// Ordered field names to project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
}

impl QueryOptions {
    /// Sets `offset = size * index`, `limit = size` and `index`.
    ///
    /// The offset saturates instead of overflowing.
    pub fn merge_pagination(&mut self, index: u64, size: u64) {
        self.offset = Some(size.saturating_mul(index));
        self.limit = Some(size);
        self.index = Some(index);
    }

    /// Sets the filter.
    pub fn merge_filter(&mut self, filter: Value) {
        self.filter = Some(filter);
    }

    /// Sets the sort specification.
    pub fn merge_order(&mut self, order: Value) {
        self.order = Some(order);
    }

    /// Sets the projection.
    pub fn merge_select(&mut self, select: Vec<String>) {
        self.select = Some(select);
    }

    /// Returns `true` if no guard has contributed anything yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merges_are_additive() {
        let mut options = QueryOptions::default();
        options.merge_filter(json!({"key": {"$gt": 10}}));
        options.merge_order(json!({"key": -1}));
        options.merge_pagination(0, 20);

        assert_eq!(options.filter, Some(json!({"key": {"$gt": 10}})));
        assert_eq!(options.order, Some(json!({"key": -1})));
        assert_eq!(options.offset, Some(0));
        assert!(options.select.is_none());
    }

    #[test]
    fn test_serializes_with_wire_names() {
        let mut options = QueryOptions::default();
        options.merge_filter(json!({"a": 1}));
        options.merge_pagination(2, 10);

        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(
            value,
            json!({"offset": 20, "limit": 10, "index": 2, "where": {"a": 1}})
        );
    }

    #[test]
    fn test_offset_saturates() {
        let mut options = QueryOptions::default();
        options.merge_pagination(u64::MAX, 200);
        assert_eq!(options.offset, Some(u64::MAX));
    }

    #[test]
    fn test_is_empty() {
        let mut options = QueryOptions::default();
        assert!(options.is_empty());
        options.merge_select(vec![]);
        assert!(!options.is_empty());
    }
}
