//! Typed configuration for Turnstile.
//!
//! - TOML and JSON configuration files
//! - `.env` files via `dotenvy`
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → `.env` → env)
//!
//! # Configuration File Format
//!
//! ```toml
//! environment = "production"
//!
//! [auth]
//! skip_verification = false
//!
//! [auth.access]
//! namespace = "ITEMS"
//! key = "svc-1"
//! secret = "..."
//!
//! [pagination]
//! index_name = "i"
//! size_name = "s"
//! min_size = 5
//! default_size = 20
//! max_size = 200
//!
//! [filter]
//! filter_name = "w"
//!
//! [sort]
//! sort_name = "o"
//!
//! [projection]
//! projection_name = "p"
//!
//! [telemetry]
//! service_name = "items-api"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//!
//! [telemetry.metrics]
//! enabled = true
//! addr = "0.0.0.0:9090"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `PREFIX__SECTION__KEY`:
//!
//! - `TURNSTILE__ENVIRONMENT=production`
//! - `TURNSTILE__AUTH__SKIP_VERIFICATION=false`
//! - `TURNSTILE__PAGINATION__MAX_SIZE=100`
//! - `TURNSTILE__TELEMETRY__METRICS__ENABLED=false`

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::TurnstileConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{AuthConfig, LogFormat, LoggingConfig, MetricsSection, TelemetryConfigSection};
