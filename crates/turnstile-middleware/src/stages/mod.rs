//! Guard stages.
//!
//! ## Request-surface contracts
//!
//! - [`contract`] - [`body`](contract::body), [`queries`](contract::queries),
//!   [`headers`](contract::headers) and [`params`](contract::params)
//!
//! ## Query options
//!
//! - [`pagination`] - `offset`, `limit`, `index`
//! - [`filter`] - `where`
//! - [`sort`] - `order`
//! - [`projection`] - `select`
//!
//! ## Access
//!
//! - [`environment`] - allow/deny by deployment environment
//! - [`delegated_auth`] - principal resolved by an [`Expander`]
//! - [`signed_access`] - HMAC request signatures

pub mod contract;
pub mod delegated_auth;
pub mod environment;
mod expression;
pub mod filter;
pub mod pagination;
pub mod projection;
pub mod signed_access;
pub mod sort;

// Re-export main types
pub use contract::ContractGuard;
pub use delegated_auth::{AuthGuard, Expander};
pub use environment::EnvGuard;
pub use filter::FilterGuard;
pub use pagination::PaginationGuard;
pub use projection::ProjectionGuard;
pub use signed_access::{sign_request, AccessGuard};
pub use sort::SortGuard;
