//! Filter guard.
//!
//! Merges a structured filter from the query string under `where`. The
//! value may arrive structured (`w[age]=3`) or as a JSON string
//! (`w={"age":3}`).

use super::expression::{lookup, parse_structured};
use crate::context::GuardContext;
use crate::middleware::{BoxFuture, Guard, Next};
use crate::sections::parse_query;
use crate::types::{Request, Response};
use turnstile_core::{FilterConfig, GuardError, GuardResult};

/// Message of every filter rejection.
pub const INVALID_FILTER: &str = "Invalid filter expression";

/// Guard deriving the `where` option from the query string.
#[derive(Debug, Clone, Default)]
pub struct FilterGuard {
    config: FilterConfig,
}

impl FilterGuard {
    /// Creates a filter guard from a configuration record.
    #[must_use]
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }
}

impl Guard for FilterGuard {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut GuardContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, GuardResult<Response>> {
        Box::pin(async move {
            let query = parse_query(request.uri().query());
            if let Some(raw) = lookup(&query, &self.config.filter_name) {
                let filter =
                    parse_structured(raw).ok_or_else(|| GuardError::bad_request(INVALID_FILTER))?;
                ctx.options_mut().merge_filter(filter);
            }
            next.run(ctx, request).await
        })
    }
}
