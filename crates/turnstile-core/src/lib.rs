//! # Turnstile Core
//!
//! Core types for the Turnstile request-contract layer.
//!
//! This crate provides the building blocks the guards are made of:
//!
//! - [`GuardError`] / [`ErrorKind`] - the closed failure taxonomy
//! - [`FieldDescriptor`] and [`matches`] - declarative value descriptors
//! - [`Contract`] / [`Section`] - ordered field contracts per request section
//! - [`QueryOptions`] - normalized pagination, filter, sort and projection
//! - Guard configuration records ([`PaginationConfig`], [`AccessCredentials`], ...)
//! - [`RequestId`] - UUID v7 request identifier

#![doc(html_root_url = "https://docs.rs/turnstile-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod contract;
mod context;
pub mod descriptor;
mod error;
mod options;
mod settings;

pub use context::RequestId;
pub use contract::{Contract, Section};
pub use descriptor::{matches, FieldDescriptor, FieldOptions, Predicate, PrimitiveKind};
pub use error::{ErrorBody, ErrorKind, GuardError, GuardResult, GENERIC_INTERNAL_MESSAGE};
pub use options::QueryOptions;
pub use settings::{
    AccessCredentials, FilterConfig, PaginationConfig, ProjectionConfig, SortConfig,
};
