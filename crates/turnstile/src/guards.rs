//! Guards built from a loaded configuration.

use std::sync::Arc;
use turnstile_config::TurnstileConfig;
use turnstile_core::AccessCredentials;
use turnstile_middleware::stages::{
    AccessGuard, AuthGuard, EnvGuard, Expander, FilterGuard, PaginationGuard, ProjectionGuard,
    SortGuard,
};
use turnstile_middleware::BoxedGuard;

/// Builds guards with the settings of one [`TurnstileConfig`].
///
/// # Example
///
/// ```
/// use turnstile::guards::GuardFactory;
/// use turnstile::middleware::Pipeline;
/// use turnstile::config::TurnstileConfig;
///
/// let guards = GuardFactory::new(TurnstileConfig::default());
/// let list = Pipeline::builder().guards(guards.query_options()).build();
///
/// assert_eq!(list.stage_names(), ["filter", "sort", "projection", "pagination"]);
/// ```
#[derive(Debug, Clone)]
pub struct GuardFactory {
    config: TurnstileConfig,
}

impl GuardFactory {
    /// Creates a factory over `config`.
    #[must_use]
    pub fn new(config: TurnstileConfig) -> Self {
        Self { config }
    }

    /// Returns the underlying configuration.
    #[must_use]
    pub fn config(&self) -> &TurnstileConfig {
        &self.config
    }

    /// Pagination guard with the configured names and bounds.
    #[must_use]
    pub fn pagination(&self) -> PaginationGuard {
        PaginationGuard::new(self.config.pagination.clone())
    }

    /// Filter guard with the configured parameter name.
    #[must_use]
    pub fn filter(&self) -> FilterGuard {
        FilterGuard::new(self.config.filter.clone())
    }

    /// Sort guard with the configured parameter name.
    #[must_use]
    pub fn sort(&self) -> SortGuard {
        SortGuard::new(self.config.sort.clone())
    }

    /// Projection guard with the configured parameter name.
    #[must_use]
    pub fn projection(&self) -> ProjectionGuard {
        ProjectionGuard::new(self.config.projection.clone())
    }

    /// Filter, sort, projection and pagination, in that order.
    #[must_use]
    pub fn query_options(&self) -> Vec<BoxedGuard> {
        vec![
            Arc::new(self.filter()),
            Arc::new(self.sort()),
            Arc::new(self.projection()),
            Arc::new(self.pagination()),
        ]
    }

    /// Environment guard allowing `allowed`, checked against the configured
    /// environment.
    #[must_use]
    pub fn environment<I, S>(&self, allowed: I) -> EnvGuard
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EnvGuard::new(allowed, self.config.environment.clone())
    }

    /// Delegated-auth guard, honoring `auth.skip_verification`.
    #[must_use]
    pub fn auth<E: Expander>(&self, expander: E) -> AuthGuard<E> {
        AuthGuard::new(expander).skip_verification(self.config.auth.skip_verification)
    }

    /// Signed-access guard with the configured credentials, honoring
    /// `auth.skip_verification`. `None` when no credentials are configured.
    #[must_use]
    pub fn access(&self) -> Option<AccessGuard> {
        self.config
            .auth
            .access
            .clone()
            .map(|credentials| self.access_with(credentials))
    }

    /// Signed-access guard with explicit credentials, honoring
    /// `auth.skip_verification`.
    #[must_use]
    pub fn access_with(&self, credentials: AccessCredentials) -> AccessGuard {
        AccessGuard::new(credentials).skip_verification(self.config.auth.skip_verification)
    }
}
