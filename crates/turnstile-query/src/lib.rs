//! # Turnstile Query
//!
//! Adapters that turn the [`QueryOptions`](turnstile_core::QueryOptions)
//! built by the query-option guards into calls on a data layer:
//!
//! - [`apply_document`] for chainable document-store cursors
//!   (`find(filter).skip(..).limit(..).sort(..).select(..)`),
//! - [`apply_relational`] for relational mappers taking one
//!   `{where, attributes, offset, limit, order}` record.
//!
//! Neither adapter executes anything; both only shape the call.

#![doc(html_root_url = "https://docs.rs/turnstile-query/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod document;
pub mod relational;

pub use document::{apply_document, DocumentQuery};
pub use relational::{apply_relational, RelationalQuery};
