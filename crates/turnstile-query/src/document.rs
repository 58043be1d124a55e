//! Document-store adapter.
//!
//! Document stores expose a chainable cursor: `find(filter)` returns a
//! query that is then narrowed with `skip`, `limit`, `sort` and `select`.
//! [`apply_document`] drives any such builder from a [`QueryOptions`]
//! record.

use serde_json::Value;
use turnstile_core::QueryOptions;

/// A chainable document query.
///
/// Each method consumes the query and returns the narrowed one.
pub trait DocumentQuery: Sized {
    /// Skips the first `offset` documents.
    fn skip(self, offset: u64) -> Self;

    /// Caps the number of returned documents.
    fn limit(self, limit: u64) -> Self;

    /// Orders the result by an opaque sort specification.
    fn sort(self, order: &Value) -> Self;

    /// Restricts the returned fields.
    fn select(self, fields: &[String]) -> Self;
}

/// Builds a document query from `options`.
///
/// `find` receives the filter (if any) and returns the base query. Then:
///
/// - `skip` is applied only for a non-zero offset,
/// - `limit` only for a non-zero limit,
/// - `sort` when an order is set,
/// - `select` when a projection is set.
///
/// # Example
///
/// ```
/// use serde_json::{json, Value};
/// use turnstile_core::QueryOptions;
/// use turnstile_query::{apply_document, DocumentQuery};
///
/// #[derive(Default)]
/// struct Calls(Vec<String>);
///
/// impl DocumentQuery for Calls {
///     fn skip(mut self, offset: u64) -> Self { self.0.push(format!("skip {offset}")); self }
///     fn limit(mut self, limit: u64) -> Self { self.0.push(format!("limit {limit}")); self }
///     fn sort(mut self, order: &Value) -> Self { self.0.push(format!("sort {order}")); self }
///     fn select(mut self, fields: &[String]) -> Self { self.0.push(format!("select {}", fields.join(","))); self }
/// }
///
/// let mut options = QueryOptions::default();
/// options.merge_pagination(0, 20);
/// options.merge_order(json!({"name": 1}));
///
/// let calls = apply_document(&options, |_filter| Calls::default());
/// assert_eq!(calls.0, ["limit 20", r#"sort {"name":1}"#]);
/// ```
pub fn apply_document<Q, F>(options: &QueryOptions, find: F) -> Q
where
    Q: DocumentQuery,
    F: FnOnce(Option<&Value>) -> Q,
{
    let mut query = find(options.filter.as_ref());

    if let Some(offset) = options.offset.filter(|&offset| offset != 0) {
        query = query.skip(offset);
    }
    if let Some(limit) = options.limit.filter(|&limit| limit != 0) {
        query = query.limit(limit);
    }
    if let Some(order) = &options.order {
        query = query.sort(order);
    }
    if let Some(select) = &options.select {
        query = query.select(select);
    }

    query
}
