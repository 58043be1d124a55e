//! Core guard trait and types.
//!
//! This module defines the [`Guard`] trait every pipeline stage implements.
//! A guard inspects the request, may enrich the [`GuardContext`], and then
//! either calls [`Next::run`] or short-circuits with a [`GuardError`].
//!
//! # Example
//!
//! ```
//! use turnstile_middleware::{BoxFuture, Guard, GuardContext, Next, Request, Response};
//! use turnstile_core::{GuardError, GuardResult};
//!
//! struct RequireJson;
//!
//! impl Guard for RequireJson {
//!     fn name(&self) -> &'static str {
//!         "require_json"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut GuardContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, GuardResult<Response>> {
//!         Box::pin(async move {
//!             if request.headers().get("content-type").is_none() {
//!                 return Err(GuardError::bad_request("content-type is required"));
//!             }
//!             next.run(ctx, request).await
//!         })
//!     }
//! }
//! ```

use crate::context::GuardContext;
use crate::pipeline::record_rejection;
use crate::types::{Request, Response};
use std::future::Future;
use std::pin::Pin;
use turnstile_core::{GuardError, GuardResult};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The terminal step of a chain: the route handler.
pub type Handler<'a> =
    Box<dyn FnOnce(&mut GuardContext, Request) -> BoxFuture<'static, GuardResult<Response>> + Send + 'a>;

/// A pipeline stage.
///
/// # Invariants
///
/// - A guard calls `next.run()` at most once; not calling it short-circuits
/// - A guard never swallows a failure returned by `next.run()`
/// - A guard only mutates the context of the request it is processing
pub trait Guard: Send + Sync + 'static {
    /// Returns the name of this guard, used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Processes the request through this guard.
    fn process<'a>(
        &'a self,
        ctx: &'a mut GuardContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, GuardResult<Response>>;
}

/// Continuation that invokes the rest of the chain.
///
/// Consumed by [`run`](Self::run), so the remainder of the chain can be
/// entered at most once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        guard: &'a dyn Guard,
        next: Box<Next<'a>>,
    },
    Handler(Handler<'a>),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that will invoke the given guard.
    pub(crate) fn new(guard: &'a dyn Guard, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                guard,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal `Next` that invokes the handler.
    pub(crate) fn handler<F>(f: F) -> Self
    where
        F: FnOnce(&mut GuardContext, Request) -> BoxFuture<'static, GuardResult<Response>>
            + Send
            + 'a,
    {
        Self {
            inner: NextInner::Handler(Box::new(f)),
        }
    }

    /// Invokes the next guard or the handler.
    ///
    /// The first failure raised along the chain is logged and counted once,
    /// attributed to the stage that raised it, then propagated unchanged.
    pub async fn run(self, ctx: &mut GuardContext, request: Request) -> GuardResult<Response> {
        let (stage, result) = match self.inner {
            NextInner::Chain { guard, next } => {
                (guard.name(), guard.process(ctx, request, *next).await)
            }
            NextInner::Handler(handler) => ("handler", handler(ctx, request).await),
        };
        if let Err(error) = &result {
            observe(ctx, stage, error);
        }
        result
    }
}

fn observe(ctx: &mut GuardContext, stage: &'static str, error: &GuardError) {
    if !ctx.rejection_recorded {
        ctx.rejection_recorded = true;
        record_rejection(stage, ctx, error);
    }
}

/// A guard built from an async function.
///
/// Used for route-specific checks that do not warrant their own type.
///
/// # Example
///
/// ```
/// use turnstile_middleware::{BoxFuture, FnGuard, GuardContext, Next, Request, Response};
/// use turnstile_core::{GuardError, GuardResult};
///
/// fn owner_only<'a>(
///     ctx: &'a mut GuardContext,
///     request: Request,
///     next: Next<'a>,
/// ) -> BoxFuture<'a, GuardResult<Response>> {
///     Box::pin(async move {
///         if request.headers().contains_key("x-owner") {
///             next.run(ctx, request).await
///         } else {
///             Err(GuardError::forbidden())
///         }
///     })
/// }
///
/// let guard = FnGuard::new("owner_only", owner_only);
/// ```
pub struct FnGuard<F> {
    name: &'static str,
    func: F,
}

impl<F> FnGuard<F> {
    /// Creates a new function-based guard.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Guard for FnGuard<F>
where
    F: for<'a> Fn(&'a mut GuardContext, Request, Next<'a>) -> BoxFuture<'a, GuardResult<Response>>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut GuardContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, GuardResult<Response>> {
        (self.func)(ctx, request, next)
    }
}
