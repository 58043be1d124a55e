//! Common types used throughout the guard pipeline.

use bytes::Bytes;
use http_body_util::Full;

/// The HTTP request type guards inspect.
///
/// This is a standard `http::Request` with a `Full<Bytes>` body.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type handlers produce.
///
/// This is a standard `http::Response` with a `Full<Bytes>` body.
pub type Response = http::Response<Full<Bytes>>;
