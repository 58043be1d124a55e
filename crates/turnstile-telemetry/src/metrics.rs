//! Prometheus metrics.
//!
//! The guard pipeline emits its counters through the `metrics` facade;
//! this module installs the Prometheus recorder that collects them.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `turnstile_guard_rejections_total` | Counter | `guard`, `kind` | Requests rejected by a guard |

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use turnstile_middleware::GUARD_REJECTIONS_TOTAL;

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Address of a scrape endpoint to serve, if any (e.g. `0.0.0.0:9090`).
    ///
    /// Without one the recorder is installed and metrics are exposed through
    /// [`render_metrics`] only.
    pub addr: Option<String>,

    /// Value of the `service` label attached to every metric.
    pub service_name: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: None,
            service_name: "turnstile".to_string(),
        }
    }
}

/// Handle to the installed recorder.
#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    handle: PrometheusHandle,
}

impl MetricsRegistry {
    /// Wraps a recorder handle.
    #[must_use]
    pub fn new(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// Renders all metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Installs the global Prometheus recorder.
///
/// With `addr` set, a scrape endpoint is served on the current Tokio
/// runtime and `Ok(None)` is returned. Otherwise the recorder is installed
/// without a listener and its registry is returned.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for an unparsable address and
/// `TelemetryError::MetricsInit` if a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<Option<MetricsRegistry>> {
    if !config.enabled {
        return Ok(None);
    }

    let builder = PrometheusBuilder::new().add_global_label("service", &config.service_name);

    let registry = match &config.addr {
        Some(addr) => {
            let addr: SocketAddr = addr
                .parse()
                .map_err(|e| TelemetryError::InvalidAddress(format!("{addr}: {e}")))?;
            builder
                .with_http_listener(addr)
                .install()
                .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
            None
        }
        None => {
            let handle = builder
                .install_recorder()
                .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
            let _ = METRICS_HANDLE.set(handle.clone());
            Some(MetricsRegistry::new(handle))
        }
    };

    describe_metrics();
    Ok(registry)
}

/// Renders metrics in Prometheus format.
///
/// Returns `None` unless [`init_metrics`] installed a recorder without a
/// listener.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

/// Registers descriptions for every metric the pipeline emits.
pub fn describe_metrics() {
    describe_counter!(
        GUARD_REJECTIONS_TOTAL,
        "Total number of requests rejected by a guard"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::Request as HttpRequest;
    use http_body_util::Full;
    use turnstile_core::GuardResult;
    use turnstile_middleware::stages::FilterGuard;
    use turnstile_middleware::{BoxFuture, GuardContext, Pipeline, Request, Response};

    fn create_handler(
        _ctx: &mut GuardContext,
        _req: Request,
    ) -> BoxFuture<'static, GuardResult<Response>> {
        Box::pin(async { Ok(http::Response::new(Full::new(Bytes::new()))) })
    }

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert!(config.addr.is_none());
    }

    #[test]
    fn test_disabled_metrics() {
        let config = MetricsConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(init_metrics(&config).unwrap().is_none());
    }

    #[test]
    fn test_invalid_address() {
        let config = MetricsConfig {
            addr: Some("not an address".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            init_metrics(&config),
            Err(TelemetryError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_rejections_are_counted() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        let pipeline = Pipeline::builder().guard(FilterGuard::default()).build();
        let result = metrics::with_local_recorder(&recorder, || {
            describe_metrics();
            let request = HttpRequest::builder()
                .uri("/items?w=not-json")
                .body(Full::new(Bytes::new()))
                .unwrap();
            runtime.block_on(pipeline.process(GuardContext::new(), request, create_handler))
        });
        assert!(result.is_err());

        let rendered = handle.render();
        assert!(rendered.contains("# HELP turnstile_guard_rejections_total"));
        let line = rendered
            .lines()
            .find(|line| line.starts_with("turnstile_guard_rejections_total{"))
            .unwrap();
        assert!(line.contains(r#"guard="filter""#));
        assert!(line.contains(r#"kind="BadRequest""#));
        assert!(line.ends_with(" 1"));
    }
}
