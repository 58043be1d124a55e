//! Field descriptors and the matcher that evaluates values against them.
//!
//! A [`FieldDescriptor`] is a declarative description of what a request field
//! must look like. The shape of a descriptor is fixed when it is built, so
//! evaluating a request never re-inspects it.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use turnstile_core::descriptor::{matches, FieldDescriptor, PrimitiveKind};
//!
//! let tags = FieldDescriptor::array_of(PrimitiveKind::String);
//! assert!(matches(&json!(["a", "b"]), &tags));
//! assert!(!matches(&json!(["a", 1]), &tags));
//!
//! let id = FieldDescriptor::pattern(r"^\d+$").unwrap();
//! assert!(matches(&json!("42"), &id));
//! assert!(!matches(&json!(42), &id));
//! ```

use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// A shareable validity predicate over a raw value.
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Primitive value kinds a descriptor can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// A JSON string.
    String,
    /// A JSON number.
    Number,
    /// A JSON boolean.
    Boolean,
    /// A JSON object (never `null`).
    Object,
    /// A JSON array.
    Array,
}

impl PrimitiveKind {
    /// Returns true when `value` is exactly of this kind.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

/// Options of a rich descriptor.
#[derive(Debug, Clone, Default)]
pub struct FieldOptions {
    /// Descriptor the value must satisfy, if any.
    pub validator: Option<Box<FieldDescriptor>>,
    /// Message reported instead of the generated one.
    pub message: Option<String>,
    /// Whether an absent value passes.
    pub optional: bool,
}

impl FieldOptions {
    /// Creates empty options: a required field with generated messages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the descriptor the value must satisfy.
    #[must_use]
    pub fn validator(mut self, validator: impl Into<FieldDescriptor>) -> Self {
        self.validator = Some(Box::new(validator.into()));
        self
    }

    /// Sets the message reported on failure.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Lets the field be absent.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Declarative description of an expected field value.
#[derive(Clone)]
pub enum FieldDescriptor {
    /// Presence check; the hint is used verbatim as the label in messages.
    Named(String),
    /// The value must be of a primitive kind.
    Kind(PrimitiveKind),
    /// The value must be a string matching the pattern.
    Pattern(Regex),
    /// The value must be an array whose every element matches.
    ArrayOf(Box<FieldDescriptor>),
    /// The value must be an array whose element `i` matches descriptor `i`.
    ///
    /// Elements past the end of the descriptor list are unconstrained.
    ArrayOfEach(Vec<FieldDescriptor>),
    /// The value must satisfy the predicate.
    Predicate(Predicate),
    /// Rich options: validator, custom message, optionality.
    Rich(FieldOptions),
}

impl FieldDescriptor {
    /// Creates a presence check labelled with `hint`.
    #[must_use]
    pub fn named(hint: impl Into<String>) -> Self {
        Self::Named(hint.into())
    }

    /// Creates a pattern descriptor.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::Pattern)
    }

    /// Creates a homogeneous array descriptor.
    #[must_use]
    pub fn array_of(element: impl Into<FieldDescriptor>) -> Self {
        Self::ArrayOf(Box::new(element.into()))
    }

    /// Creates a positional (tuple) array descriptor.
    #[must_use]
    pub fn array_of_each<I, D>(elements: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<FieldDescriptor>,
    {
        Self::ArrayOfEach(elements.into_iter().map(Into::into).collect())
    }

    /// Creates a predicate descriptor.
    #[must_use]
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(predicate))
    }

    /// Returns a short name of the descriptor's shape, for logs.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Named(_) => "named",
            Self::Kind(_) => "kind",
            Self::Pattern(_) => "pattern",
            Self::ArrayOf(_) => "array_of",
            Self::ArrayOfEach(_) => "array_of_each",
            Self::Predicate(_) => "predicate",
            Self::Rich(_) => "rich",
        }
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(hint) => f.debug_tuple("Named").field(hint).finish(),
            Self::Kind(kind) => f.debug_tuple("Kind").field(kind).finish(),
            Self::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Self::ArrayOf(element) => f.debug_tuple("ArrayOf").field(element).finish(),
            Self::ArrayOfEach(elements) => f.debug_tuple("ArrayOfEach").field(elements).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::Rich(options) => f.debug_tuple("Rich").field(options).finish(),
        }
    }
}

impl From<PrimitiveKind> for FieldDescriptor {
    fn from(kind: PrimitiveKind) -> Self {
        Self::Kind(kind)
    }
}

impl From<Regex> for FieldDescriptor {
    fn from(regex: Regex) -> Self {
        Self::Pattern(regex)
    }
}

impl From<&str> for FieldDescriptor {
    fn from(hint: &str) -> Self {
        Self::Named(hint.to_string())
    }
}

impl From<String> for FieldDescriptor {
    fn from(hint: String) -> Self {
        Self::Named(hint)
    }
}

impl From<FieldOptions> for FieldDescriptor {
    fn from(options: FieldOptions) -> Self {
        Self::Rich(options)
    }
}

impl From<Predicate> for FieldDescriptor {
    fn from(predicate: Predicate) -> Self {
        Self::Predicate(predicate)
    }
}

/// Evaluates `value` against `descriptor`.
///
/// Pure and total: the same pair always yields the same answer and the
/// function never panics. A panicking predicate counts as a non-match.
/// Shapes without a value constraint (`Named`, a `Rich` descriptor without
/// a validator) fail closed.
#[must_use]
pub fn matches(value: &Value, descriptor: &FieldDescriptor) -> bool {
    match descriptor {
        FieldDescriptor::Kind(kind) => kind.accepts(value),
        FieldDescriptor::Pattern(regex) => value.as_str().is_some_and(|s| regex.is_match(s)),
        FieldDescriptor::ArrayOf(element) => value
            .as_array()
            .is_some_and(|items| items.iter().all(|item| matches(item, element))),
        FieldDescriptor::ArrayOfEach(elements) => value.as_array().is_some_and(|items| {
            elements
                .iter()
                .enumerate()
                .all(|(i, element)| items.get(i).is_some_and(|item| matches(item, element)))
        }),
        FieldDescriptor::Predicate(predicate) => run_predicate(predicate, value),
        FieldDescriptor::Rich(FieldOptions {
            validator: Some(validator),
            ..
        }) => matches(value, validator),
        FieldDescriptor::Named(_) | FieldDescriptor::Rich(_) => false,
    }
}

fn run_predicate(predicate: &Predicate, value: &Value) -> bool {
    catch_unwind(AssertUnwindSafe(|| predicate(value))).unwrap_or_else(|_| {
        tracing::warn!("field predicate panicked; treating value as invalid");
        false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_primitive_kinds() {
        assert!(matches(&json!("abc"), &PrimitiveKind::String.into()));
        assert!(matches(&json!(1.5), &PrimitiveKind::Number.into()));
        assert!(matches(&json!(false), &PrimitiveKind::Boolean.into()));
        assert!(matches(&json!({}), &PrimitiveKind::Object.into()));
        assert!(matches(&json!([]), &PrimitiveKind::Array.into()));

        assert!(!matches(&json!("1"), &PrimitiveKind::Number.into()));
        assert!(!matches(&json!([]), &PrimitiveKind::Object.into()));
    }

    #[test]
    fn test_object_kind_excludes_null() {
        assert!(!matches(&Value::Null, &PrimitiveKind::Object.into()));
    }

    #[test]
    fn test_pattern_rejects_non_strings() {
        let digits = FieldDescriptor::pattern(r"^\d+$").unwrap();
        assert!(matches(&json!("123"), &digits));
        assert!(!matches(&json!("abc"), &digits));
        assert!(!matches(&json!(123), &digits));
        assert!(!matches(&json!(["123"]), &digits));
    }

    #[test]
    fn test_array_of() {
        let numbers = FieldDescriptor::array_of(PrimitiveKind::Number);
        assert!(matches(&json!([1, 2, 3]), &numbers));
        assert!(matches(&json!([]), &numbers));
        assert!(!matches(&json!([1, "2"]), &numbers));
        assert!(!matches(&json!({"0": 1}), &numbers));
    }

    #[test]
    fn test_nested_array_of() {
        let matrix = FieldDescriptor::array_of(FieldDescriptor::array_of(PrimitiveKind::Number));
        assert!(matches(&json!([[1], [2, 3]]), &matrix));
        assert!(!matches(&json!([[1], 2]), &matrix));
    }

    #[test]
    fn test_array_of_each_positional() {
        let pair = FieldDescriptor::array_of_each([PrimitiveKind::String, PrimitiveKind::Number]);
        assert!(matches(&json!(["a", 1]), &pair));
        assert!(!matches(&json!([1, "a"]), &pair));
        assert!(!matches(&json!(["a"]), &pair));
        assert!(!matches(&json!("a"), &pair));
    }

    #[test]
    fn test_array_of_each_extra_elements_unconstrained() {
        let pair = FieldDescriptor::array_of_each([PrimitiveKind::String, PrimitiveKind::Number]);
        assert!(matches(&json!(["a", 1, null, {"x": true}]), &pair));
    }

    #[test]
    fn test_predicate() {
        let even = FieldDescriptor::predicate(|v| v.as_i64().is_some_and(|n| n % 2 == 0));
        assert!(matches(&json!(4), &even));
        assert!(!matches(&json!(3), &even));
        assert!(!matches(&json!("4"), &even));
    }

    #[test]
    fn test_panicking_predicate_is_a_non_match() {
        let explosive = FieldDescriptor::predicate(|_| panic!("boom"));
        assert!(!matches(&json!(1), &explosive));
    }

    #[test]
    fn test_rich_delegates_to_validator() {
        let rich: FieldDescriptor = FieldOptions::new().validator(PrimitiveKind::Boolean).into();
        assert!(matches(&json!(true), &rich));
        assert!(!matches(&json!("true"), &rich));
    }

    #[test]
    fn test_shapes_without_constraint_fail_closed() {
        assert!(!matches(&json!("x"), &FieldDescriptor::named("hint")));
        assert!(!matches(&json!("x"), &FieldOptions::new().message("m").into()));
    }

    #[test]
    fn test_debug_hides_predicate() {
        let descriptor = FieldDescriptor::array_of(FieldDescriptor::predicate(|_| true));
        assert_eq!(format!("{descriptor:?}"), "ArrayOf(Predicate(..))");
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-z0-9]{0,8}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 16, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::hash_map("[a-z]{1,4}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn descriptors() -> Vec<FieldDescriptor> {
        vec![
            PrimitiveKind::String.into(),
            PrimitiveKind::Object.into(),
            FieldDescriptor::pattern("^[a-z]+$").unwrap(),
            FieldDescriptor::array_of(PrimitiveKind::Number),
            FieldDescriptor::array_of_each([PrimitiveKind::String]),
            FieldDescriptor::predicate(Value::is_null),
            FieldDescriptor::named("label"),
        ]
    }

    proptest! {
        #[test]
        fn prop_matcher_is_deterministic(value in arb_json()) {
            for descriptor in descriptors() {
                prop_assert_eq!(matches(&value, &descriptor), matches(&value, &descriptor));
            }
        }
    }
}
