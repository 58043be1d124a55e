//! Main configuration type.

use serde::{Deserialize, Serialize};
use turnstile_core::{FilterConfig, PaginationConfig, ProjectionConfig, SortConfig};

use crate::schema::default_environment;
use crate::{AuthConfig, ConfigError, LogFormat, TelemetryConfigSection};

/// Complete Turnstile configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use turnstile_config::TurnstileConfig;
///
/// let config = TurnstileConfig::default();
/// assert_eq!(config.environment, "development");
/// assert_eq!(config.pagination.default_size, 20);
/// assert_eq!(config.filter.filter_name, "w");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TurnstileConfig {
    /// Deployment environment name, consulted by environment guards.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Delegated-auth and signed-access settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Pagination guard settings.
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Filter guard settings.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Sort guard settings.
    #[serde(default)]
    pub sort: SortConfig,

    /// Projection guard settings.
    #[serde(default)]
    pub projection: ProjectionConfig,

    /// Logging and metrics.
    #[serde(default)]
    pub telemetry: TelemetryConfigSection,
}

impl Default for TurnstileConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            auth: AuthConfig::default(),
            pagination: PaginationConfig::default(),
            filter: FilterConfig::default(),
            sort: SortConfig::default(),
            projection: ProjectionConfig::default(),
            telemetry: TelemetryConfigSection::default(),
        }
    }
}

impl TurnstileConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first of:
    /// - `Empty` for a blank environment or query-option parameter name
    /// - `Pagination` for inconsistent page-size bounds
    /// - `DuplicateParameter` when two guards share a parameter name
    /// - `IncompleteCredentials` for signed-access credentials with a blank part
    /// - `LogLevel` for a log filter that does not parse
    /// - `MetricsAddr` for a metrics address that is not a socket address
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environment.trim().is_empty() {
            return Err(ConfigError::Empty {
                field: "environment",
            });
        }

        self.pagination
            .validate()
            .map_err(ConfigError::Pagination)?;

        let names = [
            ("pagination.index_name", &self.pagination.index_name),
            ("pagination.size_name", &self.pagination.size_name),
            ("filter.filter_name", &self.filter.filter_name),
            ("sort.sort_name", &self.sort.sort_name),
            ("projection.projection_name", &self.projection.projection_name),
        ];
        for (i, &(field, name)) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(ConfigError::Empty { field });
            }
            if let Some(&(taken_by, _)) = names[..i].iter().find(|(_, earlier)| *earlier == name) {
                return Err(ConfigError::DuplicateParameter {
                    name: name.clone(),
                    field,
                    taken_by,
                });
            }
        }

        if let Some(access) = &self.auth.access {
            if access.namespace.is_empty() || access.key.is_empty() || access.secret.is_empty() {
                return Err(ConfigError::IncompleteCredentials);
            }
        }

        if self.telemetry.logging.enabled {
            turnstile_telemetry::logging::create_env_filter(&self.telemetry.logging.level)
                .map_err(|e| ConfigError::LogLevel {
                    level: self.telemetry.logging.level.clone(),
                    reason: e.to_string(),
                })?;
        }

        if self.telemetry.metrics.enabled {
            if let Some(addr) = &self.telemetry.metrics.addr {
                if addr.parse::<std::net::SocketAddr>().is_err() {
                    return Err(ConfigError::MetricsAddr { addr: addr.clone() });
                }
            }
        }

        Ok(())
    }

    /// Development preset: pretty `debug` logs, environment `development`.
    ///
    /// # Example
    ///
    /// ```
    /// use turnstile_config::TurnstileConfig;
    ///
    /// let config = TurnstileConfig::development();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.environment = "development".to_string();
        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.telemetry.logging.ansi_enabled = true;
        config.telemetry.logging.include_location = true;

        config
    }

    /// Production preset: JSON `info` logs, environment `production`,
    /// verification never skipped.
    ///
    /// # Example
    ///
    /// ```
    /// use turnstile_config::{LogFormat, TurnstileConfig};
    ///
    /// let config = TurnstileConfig::production();
    /// assert_eq!(config.telemetry.logging.format, LogFormat::Json);
    /// assert!(!config.auth.skip_verification);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.environment = "production".to_string();
        config.auth.skip_verification = false;
        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = LogFormat::Json;
        config.telemetry.logging.ansi_enabled = false;

        config
    }
}
