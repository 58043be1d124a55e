//! Sort guard.
//!
//! Merges a structured sort specification from the query string under
//! `order`. Accepts the same forms as the filter guard.

use super::expression::{lookup, parse_structured};
use crate::context::GuardContext;
use crate::middleware::{BoxFuture, Guard, Next};
use crate::sections::parse_query;
use crate::types::{Request, Response};
use turnstile_core::{GuardError, GuardResult, SortConfig};

/// Message of every sort rejection.
pub const INVALID_SORT: &str = "Invalid sort expression";

/// Guard deriving the `order` option from the query string.
#[derive(Debug, Clone, Default)]
pub struct SortGuard {
    config: SortConfig,
}

impl SortGuard {
    /// Creates a sort guard from a configuration record.
    #[must_use]
    pub fn new(config: SortConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SortConfig {
        &self.config
    }
}

impl Guard for SortGuard {
    fn name(&self) -> &'static str {
        "sort"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut GuardContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, GuardResult<Response>> {
        Box::pin(async move {
            let query = parse_query(request.uri().query());
            if let Some(raw) = lookup(&query, &self.config.sort_name) {
                let order =
                    parse_structured(raw).ok_or_else(|| GuardError::bad_request(INVALID_SORT))?;
                ctx.options_mut().merge_order(order);
            }
            next.run(ctx, request).await
        })
    }
}
