//! Read-only views over the four request sections.
//!
//! Guards never touch the raw request to look up a field; they go through
//! a [`SectionView`], which gives every section the same shape:
//!
//! | Section | Source | Absent when |
//! |---------|--------|-------------|
//! | `body` | body parsed as JSON, empty body reads as `{}` | body is not valid JSON |
//! | `query` | URI query string decoded into an object | never |
//! | `header` | header map, case-insensitive | never |
//! | `params` | path parameters in the [`GuardContext`] | router attached none |
//!
//! Query strings decode `key=value` pairs as strings. Repeated keys and
//! `key[]` collect into arrays, and `key[sub]` nests one object level per
//! bracket pair, so `w[age]=3&o[]=a&o[]=b` reads as
//! `{"w": {"age": "3"}, "o": ["a", "b"]}`.

use crate::context::GuardContext;
use crate::types::Request;
use bytes::Bytes;
use http::HeaderMap;
use http_body_util::{BodyExt, Full};
use serde_json::{Map, Value};

/// A present request section.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionView<'r> {
    /// A structured section: body, query or params.
    Fields(Value),
    /// The header map, looked up by name.
    Headers(&'r HeaderMap),
}

impl<'r> SectionView<'r> {
    /// Views a parsed body.
    #[must_use]
    pub fn body(body: Option<Value>) -> Option<Self> {
        body.map(Self::Fields)
    }

    /// Views the query string of a request.
    #[must_use]
    pub fn query(request: &Request) -> Option<Self> {
        Some(Self::Fields(parse_query(request.uri().query())))
    }

    /// Views the headers of a request.
    #[must_use]
    pub fn headers(request: &'r Request) -> Option<Self> {
        Some(Self::Headers(request.headers()))
    }

    /// Views the path parameters attached to the context.
    #[must_use]
    pub fn params(ctx: &GuardContext) -> Option<Self> {
        ctx.params().cloned().map(|params| Self::Fields(Value::Object(params)))
    }

    /// Looks up a field; `None` means absent.
    ///
    /// A JSON `null` is a present value. Header values that are not
    /// visible ASCII read as absent.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        match self {
            Self::Fields(value) => value.get(name).cloned(),
            Self::Headers(headers) => headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(|value| Value::String(value.to_string())),
        }
    }
}

/// Buffers the request body, returning the rebuilt request and the bytes.
pub async fn buffer_body(request: Request) -> (Request, Bytes) {
    let (parts, body) = request.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(never) => match never {},
    };
    (Request::from_parts(parts, Full::new(bytes.clone())), bytes)
}

/// Parses a buffered body as JSON.
///
/// An empty (or all-whitespace) body reads as `{}`; anything that is not
/// valid JSON reads as `None`.
#[must_use]
pub fn parse_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Some(Value::Object(Map::new()));
    }
    serde_json::from_slice(bytes).ok()
}

/// Decodes a URI query string into a JSON object of strings.
///
/// A missing or undecodable query string reads as the empty object.
#[must_use]
pub fn parse_query(query: Option<&str>) -> Value {
    let mut root = Map::new();
    let pairs: Vec<(String, String)> = query
        .and_then(|query| serde_urlencoded::from_str(query).ok())
        .unwrap_or_default();

    for (key, value) in pairs {
        let (name, path) = split_key(&key);
        insert(&mut root, name, &path, value);
    }
    Value::Object(root)
}

/// Splits `a[b][]` into `("a", ["b", ""])`.
///
/// Keys with unbalanced brackets are taken literally.
fn split_key(key: &str) -> (&str, Vec<&str>) {
    let Some(open) = key.find('[') else {
        return (key, Vec::new());
    };
    if open == 0 {
        return (key, Vec::new());
    }

    let mut path = Vec::new();
    let mut rest = &key[open..];
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else {
            return (key, Vec::new());
        };
        path.push(&inner[..close]);
        rest = &inner[close + 1..];
    }
    if rest.is_empty() {
        (&key[..open], path)
    } else {
        (key, Vec::new())
    }
}

fn insert(slot: &mut Map<String, Value>, name: &str, path: &[&str], value: String) {
    match path.split_first() {
        None => append(slot, name, Value::String(value)),
        Some((&"", _)) => {
            let entry = slot
                .entry(name.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            match entry {
                Value::Array(items) => items.push(Value::String(value)),
                other => *other = Value::Array(vec![other.take(), Value::String(value)]),
            }
        }
        Some((child, rest)) => {
            let entry = slot
                .entry(name.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            // A scalar already stored under this name wins.
            if let Value::Object(nested) = entry {
                insert(nested, child, rest, value);
            }
        }
    }
}

fn append(slot: &mut Map<String, Value>, name: &str, value: Value) {
    match slot.get_mut(name) {
        None => {
            slot.insert(name.to_string(), value);
        }
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => *existing = Value::Array(vec![existing.take(), value]),
    }
}
