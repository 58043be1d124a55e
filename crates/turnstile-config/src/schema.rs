//! Configuration schema types.
//!
//! Sections that are specific to configuration files. The guard records
//! (`PaginationConfig`, `FilterConfig`, ...) live in `turnstile-core` and
//! are embedded as-is.

use serde::{Deserialize, Serialize};
use turnstile_core::AccessCredentials;
use turnstile_telemetry::{LogConfig, MetricsConfig, TelemetryConfig};

/// Authentication section.
///
/// # Example
///
/// ```
/// use turnstile_config::AuthConfig;
///
/// let config: AuthConfig = toml::from_str(r#"
///     skip_verification = false
///
///     [access]
///     namespace = "ITEMS"
///     key = "svc-1"
///     secret = "s3cr3t"
/// "#).unwrap();
///
/// assert_eq!(config.access.unwrap().header_prefix(), "ITEMSsvc-1:");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Bypass the delegated-auth and signed-access guards.
    ///
    /// Meant for test harnesses; the production preset forces it off.
    #[serde(default)]
    pub skip_verification: bool,

    /// Credentials for the signed-access guard, if the service uses one.
    #[serde(default)]
    pub access: Option<AccessCredentials>,
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Enable metrics collection.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Prometheus scrape endpoint address; unset means no listener.
    #[serde(default)]
    pub addr: Option<String>,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: None,
        }
    }
}

/// Telemetry configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfigSection {
    /// Service name for telemetry identification.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsSection,
}

impl Default for TelemetryConfigSection {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            logging: LoggingConfig::default(),
            metrics: MetricsSection::default(),
        }
    }
}

impl TelemetryConfigSection {
    /// Converts the section into the record `turnstile-telemetry` consumes.
    #[must_use]
    pub fn to_telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig::builder()
            .service_name(&self.service_name)
            .logging(LogConfig {
                enabled: self.logging.enabled,
                level: self.logging.level.clone(),
                json_format: self.logging.format == LogFormat::Json,
                ansi: self.logging.ansi_enabled,
                file_line_info: self.logging.include_location,
                include_target: true,
            })
            .metrics(MetricsConfig {
                enabled: self.metrics.enabled,
                addr: self.metrics.addr.clone(),
                ..MetricsConfig::default()
            })
            .build()
    }
}

fn default_service_name() -> String {
    "turnstile-service".to_string()
}

pub(crate) fn default_environment() -> String {
    "development".to_string()
}

fn default_true() -> bool {
    true
}
