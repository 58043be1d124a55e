//! Per-request guard context.
//!
//! The [`GuardContext`] is the side channel that flows through the guard
//! chain alongside the request. It is created for exactly one request and
//! passed by `&mut` from guard to guard, so no locking is ever needed.

use serde_json::{Map, Value};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Instant;
use turnstile_core::{QueryOptions, RequestId};

/// Context that flows through the guard pipeline.
///
/// Guards enrich it as the request advances: the query-option guards merge
/// into [`options`](Self::options), the delegated-auth guard attaches the
/// principal, and route code can stash anything else as a typed extension.
///
/// # Example
///
/// ```
/// use turnstile_middleware::GuardContext;
///
/// let mut ctx = GuardContext::new().with_params([("id", "42")]);
/// assert_eq!(ctx.params().unwrap()["id"], "42");
///
/// ctx.options_mut().merge_pagination(1, 20);
/// assert_eq!(ctx.options().offset, Some(20));
///
/// assert!(!ctx.is_authenticated());
/// ctx.set_principal(String::from("user-1"));
/// assert_eq!(ctx.principal::<String>().map(String::as_str), Some("user-1"));
/// ```
#[derive(Debug)]
pub struct GuardContext {
    /// Unique identifier for this request.
    request_id: RequestId,

    /// Path parameters resolved by the router, if it attached any.
    params: Option<Map<String, Value>>,

    /// Normalized query options built up by the query-option guards.
    options: QueryOptions,

    /// Principal resolved by the delegated-auth guard.
    principal: Option<Box<dyn Any + Send + Sync>>,

    /// When the request entered the pipeline.
    started_at: Instant,

    /// Type-erased extension data.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,

    /// Set once the first rejection has been logged and counted.
    pub(crate) rejection_recorded: bool,
}

impl GuardContext {
    /// Creates a context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with a specific request ID.
    ///
    /// Useful when the request ID was provided by a client or upstream service.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            params: None,
            options: QueryOptions::default(),
            principal: None,
            started_at: Instant::now(),
            extensions: HashMap::new(),
            rejection_recorded: false,
        }
    }

    /// Attaches path parameters, as a router does after matching a route.
    #[must_use]
    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.set_params(params);
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the path parameters, or `None` if the router attached none.
    #[must_use]
    pub fn params(&self) -> Option<&Map<String, Value>> {
        self.params.as_ref()
    }

    /// Replaces the path parameters.
    pub fn set_params<I, K, V>(&mut self, params: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params = Some(
            params
                .into_iter()
                .map(|(name, value)| (name.into(), Value::String(value.into())))
                .collect(),
        );
    }

    /// Returns the normalized query options.
    #[must_use]
    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Returns the normalized query options for merging.
    pub fn options_mut(&mut self) -> &mut QueryOptions {
        &mut self.options
    }

    /// Attaches the principal of an authenticated request.
    pub fn set_principal<P: Send + Sync + 'static>(&mut self, principal: P) {
        self.principal = Some(Box::new(principal));
    }

    /// Returns the principal if one of type `P` is attached.
    #[must_use]
    pub fn principal<P: Send + Sync + 'static>(&self) -> Option<&P> {
        self.principal.as_ref().and_then(|p| p.downcast_ref())
    }

    /// Returns `true` once a principal has been attached.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    /// Returns the elapsed time since the request entered the pipeline.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Checks if an extension of the given type exists.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl Default for GuardContext {
    fn default() -> Self {
        Self::new()
    }
}
