//! # Turnstile Middleware
//!
//! Guard pipeline and guard stages for the Turnstile request-contract layer.
//!
//! Each route declares an ordered [`Pipeline`] of guards. A guard inspects
//! the request, may enrich the per-request [`GuardContext`], and then either
//! passes control on or short-circuits with a
//! [`GuardError`](turnstile_core::GuardError):
//!
//! ```text
//! Request → headers → auth → filter → sort → projection → pagination → Handler
//!              │        │       │                             │
//!              └────────┴───────┴──── GuardError ─────────────┴──→ caller
//! ```
//!
//! ## Stages
//!
//! | Guard | Checks | On failure |
//! |-------|--------|------------|
//! | [`body`](stages::contract::body) / [`queries`](stages::contract::queries) / [`headers`](stages::contract::headers) / [`params`](stages::contract::params) | field contracts | 400 |
//! | [`PaginationGuard`](stages::PaginationGuard) | `i`, `s` | 400 |
//! | [`FilterGuard`](stages::FilterGuard) / [`SortGuard`](stages::SortGuard) / [`ProjectionGuard`](stages::ProjectionGuard) | `w`, `o`, `p` | 400 |
//! | [`EnvGuard`](stages::EnvGuard) | deployment environment | 403 |
//! | [`AuthGuard`](stages::AuthGuard) | principal via an [`Expander`](stages::Expander) | 401 |
//! | [`AccessGuard`](stages::AccessGuard) | HMAC request signature | 401 |
//!
//! ## Example
//!
//! ```
//! use turnstile_core::Contract;
//! use turnstile_middleware::stages::{contract, FilterGuard, PaginationGuard};
//! use turnstile_middleware::Pipeline;
//!
//! let list_items = Pipeline::builder()
//!     .guard(contract::headers(Contract::required(["X-ID"])))
//!     .guard(FilterGuard::default())
//!     .guard(PaginationGuard::default())
//!     .build();
//!
//! assert_eq!(list_items.stage_names(), ["headers", "filter", "pagination"]);
//! ```

#![doc(html_root_url = "https://docs.rs/turnstile-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod sections;
pub mod stages;
pub mod types;

// Re-export main types at crate root
pub use context::GuardContext;
pub use middleware::{BoxFuture, FnGuard, Guard, Handler, Next};
pub use pipeline::{BoxedGuard, Pipeline, PipelineBuilder, GUARD_REJECTIONS_TOTAL};
pub use sections::SectionView;
pub use types::{Request, Response};
