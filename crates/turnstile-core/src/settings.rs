//! Guard configuration records.
//!
//! Plain records accepted by the guard constructors. Every field has a
//! documented default except [`AccessCredentials`], which the route author
//! must always supply.

use serde::{Deserialize, Serialize};

/// Pagination guard configuration.
///
/// # Example
///
/// ```
/// use turnstile_core::PaginationConfig;
///
/// let config = PaginationConfig::default();
/// assert_eq!(config.index_name, "i");
/// assert_eq!(config.size_name, "s");
/// assert_eq!((config.min_size, config.default_size, config.max_size), (5, 20, 200));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaginationConfig {
    /// Query parameter carrying the page index.
    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// Query parameter carrying the page size.
    #[serde(default = "default_size_name")]
    pub size_name: String,

    /// Largest accepted page size.
    #[serde(default = "default_max_size")]
    pub max_size: u64,

    /// Smallest accepted page size.
    #[serde(default = "default_min_size")]
    pub min_size: u64,

    /// Page size used when the query does not carry one.
    #[serde(default = "default_default_size")]
    pub default_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            index_name: default_index_name(),
            size_name: default_size_name(),
            max_size: default_max_size(),
            min_size: default_min_size(),
            default_size: default_default_size(),
        }
    }
}

impl PaginationConfig {
    /// Checks `min_size <= default_size <= max_size` and distinct key names.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_size > self.max_size {
            return Err(format!(
                "min_size ({}) must not exceed max_size ({})",
                self.min_size, self.max_size
            ));
        }
        if !(self.min_size..=self.max_size).contains(&self.default_size) {
            return Err(format!(
                "default_size ({}) must lie within [{}, {}]",
                self.default_size, self.min_size, self.max_size
            ));
        }
        if self.index_name == self.size_name {
            return Err("index_name and size_name must differ".to_string());
        }
        Ok(())
    }
}

fn default_index_name() -> String {
    "i".to_string()
}

fn default_size_name() -> String {
    "s".to_string()
}

fn default_max_size() -> u64 {
    200
}

fn default_min_size() -> u64 {
    5
}

fn default_default_size() -> u64 {
    20
}

/// Filter guard configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// Query parameter carrying the filter expression.
    #[serde(default = "default_filter_name")]
    pub filter_name: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            filter_name: default_filter_name(),
        }
    }
}

fn default_filter_name() -> String {
    "w".to_string()
}

/// Sort guard configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SortConfig {
    /// Query parameter carrying the sort expression.
    #[serde(default = "default_sort_name")]
    pub sort_name: String,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            sort_name: default_sort_name(),
        }
    }
}

fn default_sort_name() -> String {
    "o".to_string()
}

/// Projection guard configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectionConfig {
    /// Query parameter carrying the projection expression.
    #[serde(default = "default_projection_name")]
    pub projection_name: String,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            projection_name: default_projection_name(),
        }
    }
}

fn default_projection_name() -> String {
    "p".to_string()
}

/// Static signing credentials for the signed-access guard.
///
/// `Debug` output never includes the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessCredentials {
    /// Signing namespace, the first part of the header prefix.
    pub namespace: String,
    /// Signing key, the second part of the header prefix.
    pub key: String,
    /// Shared HMAC secret.
    pub secret: String,
}

impl AccessCredentials {
    /// Creates a credentials record.
    #[must_use]
    pub fn new(
        namespace: impl Into<String>,
        key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
            secret: secret.into(),
        }
    }

    /// Returns the `<namespace><key>:` prefix every valid header starts with.
    #[must_use]
    pub fn header_prefix(&self) -> String {
        format!("{}{}:", self.namespace, self.key)
    }
}

impl std::fmt::Debug for AccessCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessCredentials")
            .field("namespace", &self.namespace)
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}
