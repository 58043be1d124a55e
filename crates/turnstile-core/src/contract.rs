//! Request-section contracts.
//!
//! A [`Contract`] maps field names to [`FieldDescriptor`]s for one section of
//! a request. Insertion order is validation order, so it decides which
//! violation a caller sees first.

use crate::descriptor::FieldDescriptor;
use indexmap::IndexMap;

/// A section of an incoming request a contract can apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// The parsed request body.
    Body,
    /// The decoded query string.
    Query,
    /// The request headers (case-insensitive lookup).
    Header,
    /// Path parameters resolved by the router.
    Params,
}

impl Section {
    /// Returns the section name used in failure messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Query => "query",
            Self::Header => "header",
            Self::Params => "params",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered mapping of field name to descriptor.
///
/// # Example
///
/// ```
/// use turnstile_core::contract::Contract;
/// use turnstile_core::descriptor::{FieldDescriptor, FieldOptions, PrimitiveKind};
///
/// let contract = Contract::new()
///     .field("name", "item name")
///     .field("key", FieldDescriptor::predicate(|v| v.is_number()))
///     .field("type", FieldOptions::new().message("type is required"));
///
/// let names: Vec<&str> = contract.iter().map(|(name, _)| name).collect();
/// assert_eq!(names, ["name", "key", "type"]);
///
/// let headers = Contract::required(["X-ID"]);
/// assert_eq!(headers.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Contract {
    fields: IndexMap<String, FieldDescriptor>,
}

impl Contract {
    /// Creates an empty contract.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a contract of presence checks labelled by the field names.
    #[must_use]
    pub fn required<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .map(|name| {
                let name = name.into();
                let hint = FieldDescriptor::Named(name.clone());
                (name, hint)
            })
            .collect()
    }

    /// Appends a field.
    ///
    /// Re-declaring a field replaces its descriptor but keeps its position.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, descriptor: impl Into<FieldDescriptor>) -> Self {
        self.fields.insert(name.into(), descriptor.into());
        self
    }

    /// Iterates fields in validation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.fields.iter().map(|(name, descriptor)| (name.as_str(), descriptor))
    }

    /// Returns the descriptor of a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the contract declares no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, D> FromIterator<(K, D)> for Contract
where
    K: Into<String>,
    D: Into<FieldDescriptor>,
{
    fn from_iter<T: IntoIterator<Item = (K, D)>>(iter: T) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, descriptor)| (name.into(), descriptor.into()))
                .collect(),
        }
    }
}
