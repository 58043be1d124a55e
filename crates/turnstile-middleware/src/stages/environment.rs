//! Environment gate.
//!
//! Coarse allow/deny by deployment environment: the guard passes only when
//! the environment it was built with is one of the allowed names. The
//! current environment is handed in at construction, usually from the
//! `environment` configuration key.

use crate::context::GuardContext;
use crate::middleware::{BoxFuture, Guard, Next};
use crate::types::{Request, Response};
use std::collections::HashSet;
use turnstile_core::{GuardError, GuardResult};

/// Guard that refuses requests outside the allowed environments.
///
/// # Example
///
/// ```
/// use turnstile_middleware::stages::EnvGuard;
///
/// let guard = EnvGuard::new(["production_test"], "development");
/// assert!(!guard.is_allowed());
///
/// let guard = EnvGuard::new(["staging", "production"], "staging");
/// assert!(guard.is_allowed());
/// ```
#[derive(Debug, Clone)]
pub struct EnvGuard {
    allowed: HashSet<String>,
    current: String,
}

impl EnvGuard {
    /// Creates a gate allowing `allowed`, evaluated against `current`.
    #[must_use]
    pub fn new<I, S>(allowed: I, current: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
            current: current.into(),
        }
    }

    /// Returns `true` if the current environment is allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.allowed.contains(&self.current)
    }
}

impl Guard for EnvGuard {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut GuardContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, GuardResult<Response>> {
        Box::pin(async move {
            if !self.is_allowed() {
                return Err(GuardError::forbidden());
            }
            next.run(ctx, request).await
        })
    }
}
