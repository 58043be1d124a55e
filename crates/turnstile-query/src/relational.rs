//! Relational adapter.
//!
//! Relational mappers take a single options record for `findAll`-style
//! calls. [`apply_relational`] assembles that record from a
//! [`QueryOptions`] and hands it to the caller's finder.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use turnstile_core::QueryOptions;

/// Options record for a relational `find_all`.
///
/// Unset keys are omitted when serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationalQuery {
    /// Row filter.
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    /// Columns to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<String>>,
    /// Rows to skip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    /// Maximum rows to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Sort specification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Value>,
}

impl From<&QueryOptions> for RelationalQuery {
    fn from(options: &QueryOptions) -> Self {
        Self {
            filter: options.filter.clone(),
            attributes: options.select.clone(),
            offset: options.offset,
            limit: options.limit,
            order: options.order.clone(),
        }
    }
}

/// Calls `find_all` with the [`RelationalQuery`] built from `options`.
///
/// `find_all` may return anything, typically a future resolving to rows.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use turnstile_core::QueryOptions;
/// use turnstile_query::apply_relational;
///
/// let mut options = QueryOptions::default();
/// options.merge_pagination(2, 10);
/// options.merge_select(vec!["id".into()]);
///
/// let record = apply_relational(&options, |query| serde_json::to_value(query).unwrap());
/// assert_eq!(record, json!({"attributes": ["id"], "offset": 20, "limit": 10}));
/// ```
pub fn apply_relational<R, F>(options: &QueryOptions, find_all: F) -> R
where
    F: FnOnce(RelationalQuery) -> R,
{
    find_all(RelationalQuery::from(options))
}
