//! Configuration loader with layered approach.

use std::env;
use std::fs;
use std::path::Path;

use turnstile_core::AccessCredentials;

use crate::{ConfigError, LogFormat, TurnstileConfig};

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values (or a preset)
/// 2. Configuration file (TOML or JSON), which replaces the whole record
/// 3. `.env` file, loaded into the process environment
/// 4. Environment variables `PREFIX__SECTION__KEY`
///
/// # Example
///
/// ```no_run
/// use turnstile_config::ConfigLoader;
///
/// # fn main() -> Result<(), turnstile_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("turnstile.toml")?
///     .with_dotenv()?
///     .with_env_prefix("TURNSTILE")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: TurnstileConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new loader starting from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: TurnstileConfig::default(),
            env_prefix: None,
        }
    }

    /// Start with the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = TurnstileConfig::development();
        self
    }

    /// Start with the production preset.
    ///
    /// # Example
    ///
    /// ```
    /// use turnstile_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_production().load().unwrap();
    /// assert_eq!(config.environment, "production");
    /// ```
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = TurnstileConfig::production();
        self
    }

    /// Load configuration from a `.toml` or `.json` file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, malformed or
    /// contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::Missing {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format (`toml` or `json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the format is unsupported.
    ///
    /// # Example
    ///
    /// ```
    /// use turnstile_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     environment = "staging"
    ///
    ///     [pagination]
    ///     max_size = 50
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.environment, "staging");
    /// assert_eq!(config.pagination.max_size, 50);
    /// assert_eq!(config.pagination.default_size, 20);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::UnsupportedFormat {
                    format: format.to_string(),
                })
            }
        };
        Ok(self)
    }

    /// Load `.env` from the current directory or its parents, if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if a `.env` file exists but is malformed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Load a specific `.env` file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if the file is missing or malformed.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.as_ref())?;
        Ok(self)
    }

    /// Enable environment overrides of the form `PREFIX__SECTION__KEY`.
    ///
    /// For example, with prefix `TURNSTILE`:
    /// - `TURNSTILE__ENVIRONMENT=production`
    /// - `TURNSTILE__AUTH__SKIP_VERIFICATION=true`
    /// - `TURNSTILE__PAGINATION__MAX_SIZE=100`
    /// - `TURNSTILE__TELEMETRY__LOGGING__LEVEL=debug`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Apply environment overrides, validate, and return the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override cannot be parsed or validation
    /// fails.
    pub fn load(mut self) -> Result<TurnstileConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_vars(env::vars(), &prefix)?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Return the configuration without overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> TurnstileConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<TurnstileConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            other => Err(ConfigError::UnsupportedFormat {
                format: other.unwrap_or_default().to_string(),
            }),
        }
    }

    fn apply_env_vars<I>(&mut self, vars: I, prefix: &str) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let marker = format!("{prefix}__");
        for (key, value) in vars.into_iter().filter(|(k, _)| k.starts_with(&marker)) {
            self.apply_env_var(&key, &value, prefix)?;
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_override(key, "a PREFIX__SECTION__KEY name"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["ENVIRONMENT"] => config.environment = value.to_string(),

            // Auth
            ["AUTH", "SKIP_VERIFICATION"] => {
                config.auth.skip_verification = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_override(key, "a boolean"))?;
            }
            ["AUTH", "ACCESS", field] => {
                let access = config
                    .auth
                    .access
                    .get_or_insert_with(|| AccessCredentials::new("", "", ""));
                match *field {
                    "NAMESPACE" => access.namespace = value.to_string(),
                    "KEY" => access.key = value.to_string(),
                    "SECRET" => access.secret = value.to_string(),
                    _ => {}
                }
            }

            // Query options
            ["PAGINATION", "INDEX_NAME"] => config.pagination.index_name = value.to_string(),
            ["PAGINATION", "SIZE_NAME"] => config.pagination.size_name = value.to_string(),
            ["PAGINATION", "MAX_SIZE"] => config.pagination.max_size = parse_u64(key, value)?,
            ["PAGINATION", "MIN_SIZE"] => config.pagination.min_size = parse_u64(key, value)?,
            ["PAGINATION", "DEFAULT_SIZE"] => {
                config.pagination.default_size = parse_u64(key, value)?;
            }
            ["FILTER", "FILTER_NAME"] => config.filter.filter_name = value.to_string(),
            ["SORT", "SORT_NAME"] => config.sort.sort_name = value.to_string(),
            ["PROJECTION", "PROJECTION_NAME"] => {
                config.projection.projection_name = value.to_string();
            }

            // Telemetry
            ["TELEMETRY", "SERVICE_NAME"] => config.telemetry.service_name = value.to_string(),
            ["TELEMETRY", "LOGGING", "ENABLED"] => {
                config.telemetry.logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_override(key, "a boolean"))?;
            }
            ["TELEMETRY", "LOGGING", "LEVEL"] => {
                config.telemetry.logging.level = value.to_string();
            }
            ["TELEMETRY", "LOGGING", "FORMAT"] => {
                config.telemetry.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_override(key, "'json' or 'pretty'"))
                    }
                };
            }
            ["TELEMETRY", "LOGGING", "ANSI_ENABLED"] => {
                config.telemetry.logging.ansi_enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_override(key, "a boolean"))?;
            }
            ["TELEMETRY", "LOGGING", "INCLUDE_LOCATION"] => {
                config.telemetry.logging.include_location = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_override(key, "a boolean"))?;
            }
            ["TELEMETRY", "METRICS", "ENABLED"] => {
                config.telemetry.metrics.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_override(key, "a boolean"))?;
            }
            ["TELEMETRY", "METRICS", "ADDR"] => {
                config.telemetry.metrics.addr = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }

            // Unknown keys are ignored
            _ => {}
        }

        Ok(())
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env_override(key, "a non-negative integer"))
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, TurnstileConfig::default());
    }

    #[test]
    fn test_loader_presets() {
        let config = ConfigLoader::new().with_development().load().unwrap();
        assert_eq!(config.telemetry.logging.format, LogFormat::Pretty);

        let config = ConfigLoader::new().with_production().load().unwrap();
        assert_eq!(config.environment, "production");
        assert_eq!(config.telemetry.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"environment": "production_test", "auth": {"skip_verification": true}}"#;

        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.environment, "production_test");
        assert!(config.auth.skip_verification);
    }

    #[test]
    fn test_loader_rejects_unknown_fields() {
        let result = ConfigLoader::new().with_string("[pagination]\npage = 1\n", "toml");
        assert!(matches!(result, Err(ConfigError::Toml(_))));

        let result = ConfigLoader::new().with_string(r#"{"server": {}}"#, "json");
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_loader_unsupported_format() {
        let result = ConfigLoader::new().with_string("", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat { ref format }) if format == "yaml"));
    }

    #[test]
    fn test_loader_validates_on_load() {
        let toml = "[pagination]\nmin_size = 10\ndefault_size = 5\n";
        let result = ConfigLoader::new().with_string(toml, "toml").unwrap().load();
        assert!(matches!(result, Err(ConfigError::Pagination(_))));
    }

    #[test]
    fn test_loader_with_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            environment = "staging"

            [auth.access]
            namespace = "TEST"
            key = "testkey"
            secret = "testsecret"

            [sort]
            sort_name = "order"

            [telemetry.logging]
            level = "turnstile_middleware=debug,info"
            format = "pretty"
            "#
        )
        .unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();

        assert_eq!(config.environment, "staging");
        assert_eq!(config.sort.sort_name, "order");
        assert_eq!(
            config.auth.access.map(|access| access.header_prefix()),
            Some("TESTtestkey:".to_string())
        );
        assert_eq!(config.telemetry.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/turnstile.toml");
        assert!(matches!(result, Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/turnstile.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, TurnstileConfig::default());
    }

    #[test]
    fn test_loader_with_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat { ref format }) if format == "ini"));
    }

    #[test]
    fn test_loader_with_dotenv_file_missing() {
        let result = ConfigLoader::new().with_dotenv_file("/nonexistent/.env");
        assert!(matches!(result, Err(ConfigError::Dotenv(_))));
    }

    #[test]
    fn test_parse_bool() {
        for truthy in ["true", "TRUE", "1", "yes", "on"] {
            assert_eq!(parse_bool(truthy), Some(true));
        }
        for falsy in ["false", "False", "0", "no", "off"] {
            assert_eq!(parse_bool(falsy), Some(false));
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    // Overrides are exercised through `apply_env_vars` with explicit pairs
    // rather than by mutating the process environment.

    #[test]
    fn test_env_overrides() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_vars(
                vars(&[
                    ("TEST__ENVIRONMENT", "production_test"),
                    ("TEST__AUTH__SKIP_VERIFICATION", "yes"),
                    ("TEST__PAGINATION__MAX_SIZE", "100"),
                    ("TEST__PAGINATION__INDEX_NAME", "page"),
                    ("TEST__PROJECTION__PROJECTION_NAME", "fields"),
                    ("TEST__TELEMETRY__LOGGING__FORMAT", "pretty"),
                    ("TEST__TELEMETRY__METRICS__ADDR", "0.0.0.0:9090"),
                    ("OTHER__ENVIRONMENT", "ignored"),
                    ("TESTING__ENVIRONMENT", "ignored"),
                ]),
                "TEST",
            )
            .unwrap();

        let config = loader.load().unwrap();
        assert_eq!(config.environment, "production_test");
        assert!(config.auth.skip_verification);
        assert_eq!(config.pagination.max_size, 100);
        assert_eq!(config.pagination.index_name, "page");
        assert_eq!(config.projection.projection_name, "fields");
        assert_eq!(config.telemetry.logging.format, LogFormat::Pretty);
        assert_eq!(config.telemetry.metrics.addr.as_deref(), Some("0.0.0.0:9090"));
    }

    #[test]
    fn test_env_override_access_credentials() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_vars(
                vars(&[
                    ("TEST__AUTH__ACCESS__NAMESPACE", "TEST"),
                    ("TEST__AUTH__ACCESS__KEY", "testkey"),
                    ("TEST__AUTH__ACCESS__SECRET", "testsecret"),
                ]),
                "TEST",
            )
            .unwrap();

        let access = loader.load().unwrap().auth.access.unwrap();
        assert_eq!(access, AccessCredentials::new("TEST", "testkey", "testsecret"));
    }

    #[test]
    fn test_env_override_partial_access_fails_validation() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__AUTH__ACCESS__KEY", "testkey", "TEST")
            .unwrap();
        assert!(matches!(
            loader.load(),
            Err(ConfigError::IncompleteCredentials)
        ));
    }

    #[test]
    fn test_env_override_parse_errors() {
        let mut loader = ConfigLoader::new();
        let cases = [
            ("TEST__PAGINATION__MIN_SIZE", "-1", "a non-negative integer"),
            ("TEST__AUTH__SKIP_VERIFICATION", "maybe", "a boolean"),
            ("TEST__TELEMETRY__LOGGING__FORMAT", "xml", "'json' or 'pretty'"),
        ];
        for (var, value, wanted) in cases {
            let err = loader.apply_env_var(var, value, "TEST").unwrap_err();
            assert!(
                matches!(err, ConfigError::EnvOverride { var: ref name, expected } if name == var && expected == wanted),
                "{var}"
            );
        }
    }
}
