//! Pagination guard.
//!
//! Reads a page index and a page size from the query string and merges
//! `offset = size * index`, `limit = size` and `index` into the request's
//! [`QueryOptions`](turnstile_core::QueryOptions).
//!
//! Both values are optional. A missing (or empty) index means page `0`, a
//! missing size means the configured default. Present values must be
//! non-negative integers, given as JSON numbers or decimal strings, and the
//! size must lie within `[min_size, max_size]`.

use super::expression::lookup;
use crate::context::GuardContext;
use crate::middleware::{BoxFuture, Guard, Next};
use crate::sections::parse_query;
use crate::types::{Request, Response};
use serde_json::Value;
use turnstile_core::{GuardError, GuardResult, PaginationConfig};

/// Message of every pagination rejection.
pub const INVALID_PAGINATION: &str = "Invalid pagination arguments";

/// Guard deriving offset and limit from the query string.
///
/// # Example
///
/// ```
/// use turnstile_core::PaginationConfig;
/// use turnstile_middleware::stages::PaginationGuard;
///
/// let guard = PaginationGuard::new(PaginationConfig {
///     size_name: "size".to_string(),
///     ..Default::default()
/// });
/// assert_eq!(guard.config().size_name, "size");
/// ```
#[derive(Debug, Clone, Default)]
pub struct PaginationGuard {
    config: PaginationConfig,
}

impl PaginationGuard {
    /// Creates a pagination guard from a configuration record.
    #[must_use]
    pub fn new(config: PaginationConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Resolves `(index, size)` from a decoded query object.
    pub fn resolve(&self, query: &Value) -> GuardResult<(u64, u64)> {
        let index = match lookup(query, &self.config.index_name) {
            Some(raw) => parse_count(raw)?,
            None => 0,
        };
        let size = match lookup(query, &self.config.size_name) {
            Some(raw) => parse_count(raw)?,
            None => self.config.default_size,
        };
        if size < self.config.min_size || size > self.config.max_size {
            return Err(GuardError::bad_request(INVALID_PAGINATION));
        }
        Ok((index, size))
    }
}

impl Guard for PaginationGuard {
    fn name(&self) -> &'static str {
        "pagination"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut GuardContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, GuardResult<Response>> {
        Box::pin(async move {
            let query = parse_query(request.uri().query());
            let (index, size) = self.resolve(&query)?;
            ctx.options_mut().merge_pagination(index, size);
            tracing::trace!(request_id = %ctx.request_id(), index, size, "pagination resolved");
            next.run(ctx, request).await
        })
    }
}

fn parse_count(raw: &Value) -> GuardResult<u64> {
    let parsed = match raw {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| GuardError::bad_request(INVALID_PAGINATION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn guard() -> PaginationGuard {
        PaginationGuard::default()
    }

    #[test]
    fn test_defaults() {
        assert_eq!(guard().resolve(&json!({})).unwrap(), (0, 20));
    }

    #[test]
    fn test_explicit_values() {
        assert_eq!(guard().resolve(&json!({"i": "3", "s": "20"})).unwrap(), (3, 20));
        assert_eq!(guard().resolve(&json!({"i": 3, "s": 20})).unwrap(), (3, 20));
    }

    #[test]
    fn test_empty_values_fall_back_to_defaults() {
        assert_eq!(guard().resolve(&json!({"i": "", "s": ""})).unwrap(), (0, 20));
    }

    #[test]
    fn test_size_bounds() {
        assert!(guard().resolve(&json!({"s": "1"})).is_err());
        assert!(guard().resolve(&json!({"s": "201"})).is_err());
        assert!(guard().resolve(&json!({"s": "5"})).is_ok());
        assert!(guard().resolve(&json!({"s": "200"})).is_ok());
    }

    #[test]
    fn test_rejects_non_integers() {
        for bad in [json!("-1"), json!("abc"), json!("1.5"), json!(-1), json!(2.5), json!(["1"])] {
            let error = guard().resolve(&json!({ "i": bad.clone() })).unwrap_err();
            assert_eq!(error.message(), INVALID_PAGINATION, "{bad}");
        }
    }

    #[test]
    fn test_custom_names() {
        let guard = PaginationGuard::new(PaginationConfig {
            index_name: "page".to_string(),
            size_name: "per".to_string(),
            ..Default::default()
        });
        assert_eq!(guard.resolve(&json!({"page": "2", "per": "10", "i": "x"})).unwrap(), (2, 10));
    }

    proptest! {
        #[test]
        fn prop_offset_is_size_times_index(index in 0u64..10_000, size in 5u64..=200) {
            let query = json!({"i": index.to_string(), "s": size.to_string()});
            let (i, s) = guard().resolve(&query).unwrap();
            let mut ctx = GuardContext::new();
            ctx.options_mut().merge_pagination(i, s);

            prop_assert_eq!(ctx.options().offset, Some(size * index));
            prop_assert_eq!(ctx.options().limit, Some(size));
            prop_assert_eq!(ctx.options().index, Some(index));
        }

        #[test]
        fn prop_out_of_bounds_size_always_fails(index in 0u64..10_000, size in prop_oneof![0u64..5, 201u64..100_000]) {
            let query = json!({"i": index.to_string(), "s": size.to_string()});
            prop_assert!(guard().resolve(&query).is_err());
        }
    }
}
