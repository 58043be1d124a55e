//! Per-route guard pipeline.
//!
//! A [`Pipeline`] is the ordered chain of guards declared for one route.
//! It is immutable once built and shared across requests; all per-request
//! state lives in the [`GuardContext`] handed to [`Pipeline::process`].
//!
//! A failure short-circuits the remainder of the chain and is returned to
//! the caller unchanged, where the boundary renderer turns it into a wire
//! response. The first failure of each request is logged and counted in
//! `turnstile_guard_rejections_total{guard, kind}`.

use crate::context::GuardContext;
use crate::middleware::{BoxFuture, Guard, Next};
use crate::types::{Request, Response};
use std::sync::Arc;
use turnstile_core::{ErrorKind, GuardError, GuardResult};

/// Counter of rejected requests, labelled by guard and failure kind.
pub const GUARD_REJECTIONS_TOTAL: &str = "turnstile_guard_rejections_total";

/// A type-erased guard that can be stored in a vector.
pub type BoxedGuard = Arc<dyn Guard>;

/// An ordered, immutable chain of guards.
///
/// # Example
///
/// ```
/// use turnstile_core::Contract;
/// use turnstile_middleware::stages::{contract, PaginationGuard};
/// use turnstile_middleware::Pipeline;
///
/// let pipeline = Pipeline::builder()
///     .guard(contract::queries(Contract::required(["code"])))
///     .guard(PaginationGuard::default())
///     .build();
///
/// assert_eq!(pipeline.stage_names(), ["queries", "pagination"]);
/// ```
#[derive(Clone, Default)]
pub struct Pipeline {
    guards: Vec<BoxedGuard>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Runs the request through every guard, then through `handler`.
    pub async fn process<H>(
        &self,
        mut ctx: GuardContext,
        request: Request,
        handler: H,
    ) -> GuardResult<Response>
    where
        H: FnOnce(&mut GuardContext, Request) -> BoxFuture<'static, GuardResult<Response>>
            + Send
            + 'static,
    {
        self.process_with(&mut ctx, request, handler).await
    }

    /// Like [`process`](Self::process), but leaves the context with the caller.
    ///
    /// Useful when the caller needs the options or principal the guards
    /// attached after the pipeline has finished.
    pub async fn process_with<H>(
        &self,
        ctx: &mut GuardContext,
        request: Request,
        handler: H,
    ) -> GuardResult<Response>
    where
        H: FnOnce(&mut GuardContext, Request) -> BoxFuture<'static, GuardResult<Response>>
            + Send
            + 'static,
    {
        let next = self.build_chain(handler);
        next.run(ctx, request).await
    }

    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut GuardContext, Request) -> BoxFuture<'static, GuardResult<Response>>
            + Send
            + 'a,
    {
        let mut next = Next::handler(handler);
        for guard in self.guards.iter().rev() {
            next = Next::new(guard.as_ref(), next);
        }
        next
    }

    /// Returns the names of all guards in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.guards.iter().map(|guard| guard.name()).collect()
    }

    /// Returns the number of guards.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.guards.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("guards", &self.stage_names())
            .finish()
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    guards: Vec<BoxedGuard>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a guard; guards run in the order they were added.
    #[must_use]
    pub fn guard<G: Guard>(mut self, guard: G) -> Self {
        self.guards.push(Arc::new(guard));
        self
    }

    /// Appends an already shared guard.
    #[must_use]
    pub fn shared_guard(mut self, guard: BoxedGuard) -> Self {
        self.guards.push(guard);
        self
    }

    /// Appends several guards in order.
    #[must_use]
    pub fn guards<I>(mut self, guards: I) -> Self
    where
        I: IntoIterator<Item = BoxedGuard>,
    {
        self.guards.extend(guards);
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            guards: self.guards,
        }
    }
}

/// Logs a rejection and bumps the rejection counter.
pub(crate) fn record_rejection(stage: &'static str, ctx: &GuardContext, error: &GuardError) {
    let kind = error.kind();
    let request_id = ctx.request_id();
    let elapsed_ms = ctx.elapsed().as_secs_f64() * 1000.0;
    if kind == ErrorKind::Internal {
        tracing::error!(
            request_id = %request_id,
            guard = stage,
            kind = kind.name(),
            status = error.status_code().as_u16(),
            reason = error.message(),
            elapsed_ms,
            "request failed with an internal fault"
        );
    } else {
        tracing::debug!(
            request_id = %request_id,
            guard = stage,
            kind = kind.name(),
            status = error.status_code().as_u16(),
            reason = error.message(),
            elapsed_ms,
            "request rejected"
        );
    }
    metrics::counter!(GUARD_REJECTIONS_TOTAL, "guard" => stage, "kind" => kind.name()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
    use http_body_util::Full;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// A test guard that records its invocation order.
    struct OrderTrackingGuard {
        name: &'static str,
        counter: Arc<AtomicUsize>,
        order: Arc<Mutex<Vec<&'static str>>>,
        reject: bool,
    }

    impl Guard for OrderTrackingGuard {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut GuardContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, GuardResult<Response>> {
            Box::pin(async move {
                self.counter.fetch_add(1, Ordering::SeqCst);
                self.order.lock().unwrap().push(self.name);
                if self.reject {
                    return Err(GuardError::bad_request(format!("{} said no", self.name)));
                }
                next.run(ctx, request).await
            })
        }
    }

    fn tracking(
        name: &'static str,
        counter: &Arc<AtomicUsize>,
        order: &Arc<Mutex<Vec<&'static str>>>,
        reject: bool,
    ) -> OrderTrackingGuard {
        OrderTrackingGuard {
            name,
            counter: counter.clone(),
            order: order.clone(),
            reject,
        }
    }

    fn create_test_request() -> Request {
        HttpRequest::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn ok(_ctx: &mut GuardContext, _req: Request) -> BoxFuture<'static, GuardResult<Response>> {
        Box::pin(async {
            Ok(HttpResponse::builder()
                .status(StatusCode::OK)
                .body(Full::new(Bytes::from("OK")))
                .unwrap())
        })
    }

    #[tokio::test]
    async fn test_pipeline_executes_in_order() {
        let counter = Arc::new(AtomicUsize::new(0));
        let order = Arc::new(Mutex::new(Vec::new()));

        let pipeline = Pipeline::builder()
            .guard(tracking("first", &counter, &order, false))
            .guard(tracking("second", &counter, &order, false))
            .guard(tracking("third", &counter, &order, false))
            .build();

        let response = pipeline
            .process(GuardContext::new(), create_test_request(), ok)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_failure_short_circuits() {
        let counter = Arc::new(AtomicUsize::new(0));
        let order = Arc::new(Mutex::new(Vec::new()));
        let handler_called = Arc::new(AtomicUsize::new(0));
        let handler_probe = handler_called.clone();

        let pipeline = Pipeline::builder()
            .guard(tracking("first", &counter, &order, false))
            .guard(tracking("second", &counter, &order, true))
            .guard(tracking("third", &counter, &order, false))
            .build();

        let mut ctx = GuardContext::new();
        let error = pipeline
            .process_with(&mut ctx, create_test_request(), move |ctx, req| {
                handler_probe.fetch_add(1, Ordering::SeqCst);
                ok(ctx, req)
            })
            .await
            .unwrap_err();

        assert_eq!(error, GuardError::bad_request("second said no"));
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(handler_called.load(Ordering::SeqCst), 0);
        assert!(ctx.rejection_recorded);
    }

    fn slow_reject<'a>(
        _ctx: &'a mut GuardContext,
        _request: Request,
        _next: Next<'a>,
    ) -> BoxFuture<'a, GuardResult<Response>> {
        Box::pin(async {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            Err(GuardError::forbidden())
        })
    }

    #[tokio::test]
    async fn test_rejection_latency_spans_the_chain() {
        let pipeline = Pipeline::builder()
            .guard(crate::middleware::FnGuard::new("slow", slow_reject))
            .build();

        let mut ctx = GuardContext::new();
        let error = pipeline
            .process_with(&mut ctx, create_test_request(), ok)
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Forbidden);
        assert!(ctx.rejection_recorded);
        assert!(ctx.elapsed() >= std::time::Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_empty_pipeline() {
        let pipeline = Pipeline::builder().build();
        assert_eq!(pipeline.stage_count(), 0);

        let response = pipeline
            .process(GuardContext::new(), create_test_request(), ok)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_pipeline_is_reusable_across_requests() {
        let counter = Arc::new(AtomicUsize::new(0));
        let order = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::builder()
            .guard(tracking("only", &counter, &order, false))
            .build();

        for _ in 0..3 {
            pipeline
                .process(GuardContext::new(), create_test_request(), ok)
                .await
                .unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_pipeline_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pipeline>();
    }

    #[test]
    fn test_stage_names() {
        let counter = Arc::new(AtomicUsize::new(0));
        let order = Arc::new(Mutex::new(Vec::new()));
        let shared: BoxedGuard = Arc::new(tracking("b", &counter, &order, false));

        let pipeline = Pipeline::builder()
            .guard(tracking("a", &counter, &order, false))
            .shared_guard(shared)
            .build();

        assert_eq!(pipeline.stage_names(), vec!["a", "b"]);
        assert_eq!(format!("{pipeline:?}"), r#"Pipeline { guards: ["a", "b"] }"#);
    }
}
