//! Why a configuration could not be loaded or was rejected.
//!
//! Source errors (I/O, TOML, JSON, `.env`) arise while reading layers.
//! The remaining variants come from [`TurnstileConfig::validate`] and name
//! the offending setting by its dotted path.
//!
//! [`TurnstileConfig::validate`]: crate::TurnstileConfig::validate

use std::path::PathBuf;
use thiserror::Error;

/// A configuration layer failed to load, or the result failed validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `with_file` was pointed at a path that does not exist.
    #[error("no configuration file at {}", .path.display())]
    Missing {
        /// The requested path.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("cannot read configuration file {}", .path.display())]
    Unreadable {
        /// The file that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Only TOML and JSON are understood.
    #[error("unsupported configuration format '{format}', expected toml or json")]
    UnsupportedFormat {
        /// The extension or format name that was given.
        format: String,
    },

    /// Malformed TOML, or a key no section declares.
    #[error("malformed TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed JSON, or a key no section declares.
    #[error("malformed JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A `.env` file could not be loaded.
    #[error("cannot load .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    /// An override variable holds a value of the wrong shape.
    #[error("{var}: expected {expected}")]
    EnvOverride {
        /// The variable name, prefix included.
        var: String,
        /// What the variable should contain.
        expected: &'static str,
    },

    /// A name that guards rely on is blank.
    #[error("{field} must not be empty")]
    Empty {
        /// Dotted path of the setting.
        field: &'static str,
    },

    /// Page-size bounds contradict each other.
    #[error("pagination: {0}")]
    Pagination(String),

    /// Two query-option guards would read the same query parameter.
    #[error("{field} reuses query parameter '{name}' already read by {taken_by}")]
    DuplicateParameter {
        /// The parameter name.
        name: String,
        /// Setting that repeats it.
        field: &'static str,
        /// Setting that declared it first.
        taken_by: &'static str,
    },

    /// `auth.access` is present with a blank namespace, key or secret.
    #[error("auth.access: namespace, key and secret must all be set")]
    IncompleteCredentials,

    /// `telemetry.logging.level` is not a filter directive.
    #[error("telemetry.logging.level '{level}' is not a valid filter: {reason}")]
    LogLevel {
        /// The rejected directive.
        level: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// `telemetry.metrics.addr` is not `host:port`.
    #[error("telemetry.metrics.addr '{addr}' is not a socket address")]
    MetricsAddr {
        /// The rejected address.
        addr: String,
    },
}

impl ConfigError {
    pub(crate) fn env_override(var: &str, expected: &'static str) -> Self {
        Self::EnvOverride {
            var: var.to_string(),
            expected,
        }
    }
}
