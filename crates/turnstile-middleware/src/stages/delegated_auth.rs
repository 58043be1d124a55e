//! Delegated authentication.
//!
//! The [`AuthGuard`] does not verify credentials itself. It hands the
//! request to a caller-supplied [`Expander`], which resolves a principal
//! (from a session store, a token introspection endpoint, ...) or reports
//! that there is none. The resolved principal is attached to the
//! [`GuardContext`] for later guards and the handler.
//!
//! The expander is awaited without a timeout; bounding it is up to the
//! transport layer. A panic inside the expander is contained and answered
//! like any other expander fault.

use crate::context::GuardContext;
use crate::middleware::{BoxFuture, Guard, Next};
use crate::types::{Request, Response};
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use turnstile_core::{GuardError, GuardResult};

/// Resolves the principal behind a request.
///
/// `Ok(None)` means the request carries no valid credentials; `Err` is a
/// fault while resolving. The guard answers `Unauthorized` to both.
///
/// # Example
///
/// ```
/// use turnstile_middleware::stages::Expander;
/// use turnstile_middleware::{BoxFuture, Request};
///
/// struct HeaderExpander;
///
/// impl Expander for HeaderExpander {
///     type Principal = String;
///
///     fn expand<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, anyhow::Result<Option<String>>> {
///         Box::pin(async move {
///             Ok(request
///                 .headers()
///                 .get("x-id")
///                 .and_then(|value| value.to_str().ok())
///                 .map(str::to_string))
///         })
///     }
/// }
/// ```
pub trait Expander: Send + Sync + 'static {
    /// The principal type attached to the context.
    type Principal: Send + Sync + 'static;

    /// Resolves the principal of `request`.
    fn expand<'a>(
        &'a self,
        request: &'a Request,
    ) -> BoxFuture<'a, anyhow::Result<Option<Self::Principal>>>;
}

/// Guard requiring a principal resolved by an [`Expander`].
#[derive(Debug, Clone)]
pub struct AuthGuard<E> {
    expander: E,
    skip_verification: bool,
}

impl<E: Expander> AuthGuard<E> {
    /// Creates a guard backed by `expander`.
    #[must_use]
    pub fn new(expander: E) -> Self {
        Self {
            expander,
            skip_verification: false,
        }
    }

    /// Bypasses the expander entirely. Meant for test harnesses only.
    #[must_use]
    pub fn skip_verification(mut self, skip: bool) -> Self {
        self.skip_verification = skip;
        self
    }
}

impl<E: Expander> Guard for AuthGuard<E> {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut GuardContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, GuardResult<Response>> {
        Box::pin(async move {
            if self.skip_verification {
                tracing::debug!(request_id = %ctx.request_id(), "auth verification skipped");
                return next.run(ctx, request).await;
            }

            let resolved = AssertUnwindSafe(async { self.expander.expand(&request).await })
                .catch_unwind()
                .await;
            match resolved {
                Ok(Ok(Some(principal))) => ctx.set_principal(principal),
                Ok(Ok(None)) => return Err(GuardError::unauthorized()),
                Ok(Err(error)) => {
                    tracing::warn!(
                        request_id = %ctx.request_id(),
                        error = %error,
                        "expander failed to resolve a principal"
                    );
                    return Err(GuardError::unauthorized());
                }
                Err(payload) => {
                    tracing::warn!(
                        request_id = %ctx.request_id(),
                        panic = panic_message(payload.as_ref()),
                        "expander panicked while resolving a principal"
                    );
                    return Err(GuardError::unauthorized());
                }
            }
            next.run(ctx, request).await
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
