//! # Turnstile
//!
//! **Declarative request guards for HTTP services**
//!
//! Each route declares an ordered chain of guards that run before its
//! handler:
//!
//! - **Contracts** – required fields and value shapes for body, query,
//!   headers and path parameters
//! - **Query options** – pagination, filter, sort and projection parsed into
//!   one normalized record, with adapters for document and relational stores
//! - **Access** – deployment-environment gates, delegated authentication and
//!   HMAC-signed requests
//!
//! Failures short-circuit the chain as a typed [`GuardError`](crate::core::GuardError)
//! carrying an HTTP status.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use turnstile::prelude::*;
//!
//! let config = ConfigLoader::new()
//!     .with_optional_file("turnstile.toml")?
//!     .with_env_prefix("TURNSTILE")
//!     .load()?;
//! init_telemetry(&config.telemetry.to_telemetry_config())?;
//!
//! let guards = GuardFactory::new(config);
//! let list_items = Pipeline::builder()
//!     .guard(contract::headers(Contract::required(["X-ID"])))
//!     .guard(guards.auth(SessionExpander::new(store)))
//!     .guards(guards.query_options())
//!     .build();
//!
//! let response = list_items.process(GuardContext::new(), request, list_handler).await;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → headers → auth → filter → sort → projection → pagination → Handler
//!                                                                        ↓
//!                                              QueryOptions → apply_document / apply_relational
//! ```

#![doc(html_root_url = "https://docs.rs/turnstile/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod guards;

// Re-export core types
pub use turnstile_core as core;

// Re-export middleware types
pub use turnstile_middleware as middleware;

// Re-export query adapters
pub use turnstile_query as query;

// Re-export configuration
pub use turnstile_config as config;

// Re-export telemetry
pub use turnstile_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use turnstile::prelude::*;
/// ```
pub mod prelude {
    pub use crate::guards::GuardFactory;

    pub use turnstile_core::{
        AccessCredentials, Contract, ErrorBody, ErrorKind, FieldDescriptor, FieldOptions,
        GuardError, GuardResult, PrimitiveKind, QueryOptions, RequestId, Section,
    };

    pub use turnstile_middleware::stages::{
        contract, sign_request, AccessGuard, AuthGuard, EnvGuard, Expander, FilterGuard,
        PaginationGuard, ProjectionGuard, SortGuard,
    };
    pub use turnstile_middleware::{
        BoxFuture, FnGuard, Guard, GuardContext, Next, Pipeline, Request, Response,
    };

    pub use turnstile_query::{apply_document, apply_relational, DocumentQuery, RelationalQuery};

    pub use turnstile_config::{ConfigLoader, TurnstileConfig};

    pub use turnstile_telemetry::{init_telemetry, TelemetryConfig};
}
