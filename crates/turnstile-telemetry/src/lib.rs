//! Observability for Turnstile guard pipelines.
//!
//! - **Logging**: guards emit `tracing` events; [`init_logging`] installs a
//!   JSON or pretty `tracing-subscriber` formatter behind an `EnvFilter`.
//! - **Metrics**: the pipeline counts rejections through the `metrics`
//!   facade; [`init_metrics`] installs the Prometheus recorder.
//!
//! # Example
//!
//! ```rust,ignore
//! use turnstile_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::builder()
//!     .service_name("items-api")
//!     .metrics_addr("0.0.0.0:9090")
//!     .build();
//!
//! init_telemetry(&config)?;
//! ```
//!
//! # Metrics Endpoint
//!
//! ```text
//! # HELP turnstile_guard_rejections_total Total number of requests rejected by a guard
//! # TYPE turnstile_guard_rejections_total counter
//! turnstile_guard_rejections_total{guard="headers",kind="BadRequest",service="items-api"} 12
//! turnstile_guard_rejections_total{guard="access",kind="Unauthorized",service="items-api"} 3
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use self::metrics::{init_metrics, render_metrics, MetricsConfig, MetricsRegistry};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// Returns the metrics registry when metrics are enabled without a scrape
/// endpoint.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<Option<MetricsRegistry>> {
    init_logging(&config.logging)?;
    let registry = init_metrics(&config.metrics)?;

    tracing::info!(
        service = %config.service_name,
        metrics = config.metrics.enabled,
        "telemetry initialized"
    );

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_with_everything_disabled() {
        let config = TelemetryConfig {
            logging: LogConfig {
                enabled: false,
                ..LogConfig::default()
            },
            metrics: MetricsConfig {
                enabled: false,
                ..MetricsConfig::default()
            },
            ..TelemetryConfig::default()
        };

        assert!(init_telemetry(&config).unwrap().is_none());
    }
}
