//! Signed-access guard.
//!
//! Verifies an HMAC request signature carried in the `authorization`
//! header:
//!
//! ```text
//! authorization: <namespace><key>:<base64 hmac-sha1(secret, input)>
//! input = <METHOD> <hex md5(json body)> <content-type> <path+query>
//! ```
//!
//! (concatenated without separators). The JSON body is re-serialized the
//! way a JavaScript client's `JSON.stringify` writes it: compact, numbers
//! in ECMAScript form (`1.0` as `1`, `1e21` as `1e+21`), and integer-like
//! object keys ascending ahead of the others, which keep their order. An
//! empty body signs as `{}`. A missing `content-type` contributes nothing.
//!
//! The scheme binds method, body, content type and target into one
//! signature but carries no timestamp or nonce, so a captured request can
//! be replayed verbatim.

use crate::context::GuardContext;
use crate::middleware::{BoxFuture, Guard, Next};
use crate::sections::{buffer_body, parse_body};
use crate::types::{Request, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use serde_json::{Map, Number, Value};
use sha1::Sha1;
use subtle::ConstantTimeEq;
use turnstile_core::{AccessCredentials, GuardError, GuardResult};

type HmacSha1 = Hmac<Sha1>;

/// Header carrying the signature.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Computes the `authorization` header value for a request.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use turnstile_core::AccessCredentials;
/// use turnstile_middleware::stages::sign_request;
///
/// let credentials = AccessCredentials::new("TEST", "testkey", "testsecret");
/// let header = sign_request(
///     &credentials,
///     "PUT",
///     &json!({"name": "xyz"}),
///     "application/json",
///     "/items/1",
/// )
/// .unwrap();
/// assert_eq!(header, "TESTtestkey:XwVtUJ2WSEj9UnEYP7uZwEKZ7lA=");
/// ```
pub fn sign_request(
    credentials: &AccessCredentials,
    method: &str,
    body: &Value,
    content_type: &str,
    path_and_query: &str,
) -> GuardResult<String> {
    let mut serialized = String::new();
    write_json(body, &mut serialized)
        .map_err(|err| GuardError::from(anyhow::anyhow!("failed to serialize body: {err}")))?;
    let digest = hex::encode(Md5::digest(serialized.as_bytes()));

    let mut mac = HmacSha1::new_from_slice(credentials.secret.as_bytes())
        .map_err(|err| GuardError::from(anyhow::anyhow!("invalid access secret: {err}")))?;
    mac.update(method.to_ascii_uppercase().as_bytes());
    mac.update(digest.as_bytes());
    mac.update(content_type.as_bytes());
    mac.update(path_and_query.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    Ok(format!("{}{}", credentials.header_prefix(), signature))
}

fn write_json(value: &Value, out: &mut String) -> serde_json::Result<()> {
    match value {
        Value::Number(number) => out.push_str(&format_number(number)),
        Value::String(text) => out.push_str(&serde_json::to_string(text)?),
        Value::Array(items) => {
            out.push('[');
            for (position, item) in items.iter().enumerate() {
                if position > 0 {
                    out.push(',');
                }
                write_json(item, out)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (position, (key, item)) in ordered_entries(map).into_iter().enumerate() {
                if position > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push(':');
                write_json(item, out)?;
            }
            out.push('}');
        }
        Value::Null | Value::Bool(_) => out.push_str(&value.to_string()),
    }
    Ok(())
}

/// Array-index keys first in ascending order, then the rest as inserted.
fn ordered_entries(map: &Map<String, Value>) -> Vec<(&String, &Value)> {
    let mut indexed: Vec<(u32, (&String, &Value))> = Vec::new();
    let mut named = Vec::with_capacity(map.len());
    for entry in map {
        match array_index(entry.0) {
            Some(index) => indexed.push((index, entry)),
            None => named.push(entry),
        }
    }
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, entry)| entry).chain(named).collect()
}

fn array_index(key: &str) -> Option<u32> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    key.parse::<u32>().ok().filter(|&index| index != u32::MAX)
}

/// ECMAScript `Number::toString` over the shortest round-trip digits.
fn format_number(number: &Number) -> String {
    let Some(value) = number.as_f64() else {
        return number.to_string();
    };
    if value == 0.0 {
        return "0".to_string();
    }

    let scientific = format!("{:e}", value.abs());
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return number.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return number.to_string();
    };
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let count = i32::try_from(digits.len()).unwrap_or(i32::MAX);
    let point = exponent + 1;

    let mut formatted = String::new();
    if value < 0.0 {
        formatted.push('-');
    }
    if count <= point && point <= 21 {
        formatted.push_str(&digits);
        formatted.extend(std::iter::repeat('0').take(usize::try_from(point - count).unwrap_or(0)));
    } else if 0 < point && point <= 21 {
        let (whole, fraction) = digits.split_at(usize::try_from(point).unwrap_or(0));
        formatted.push_str(whole);
        formatted.push('.');
        formatted.push_str(fraction);
    } else if -6 < point && point <= 0 {
        formatted.push_str("0.");
        formatted.extend(std::iter::repeat('0').take(usize::try_from(-point).unwrap_or(0)));
        formatted.push_str(&digits);
    } else {
        let (first, rest) = digits.split_at(1);
        formatted.push_str(first);
        if !rest.is_empty() {
            formatted.push('.');
            formatted.push_str(rest);
        }
        formatted.push('e');
        formatted.push(if exponent < 0 { '-' } else { '+' });
        formatted.push_str(&exponent.abs().to_string());
    }
    formatted
}

/// Guard verifying the request signature.
#[derive(Debug, Clone)]
pub struct AccessGuard {
    credentials: AccessCredentials,
    skip_verification: bool,
}

impl AccessGuard {
    /// Creates a guard verifying against `credentials`.
    #[must_use]
    pub fn new(credentials: AccessCredentials) -> Self {
        Self {
            credentials,
            skip_verification: false,
        }
    }

    /// Bypasses verification entirely. Meant for test harnesses only.
    #[must_use]
    pub fn skip_verification(mut self, skip: bool) -> Self {
        self.skip_verification = skip;
        self
    }

    fn verify(&self, request: &Request, body: &[u8]) -> GuardResult<()> {
        let presented = request
            .headers()
            .get(AUTHORIZATION_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(GuardError::unauthorized)?;
        if !presented.starts_with(&self.credentials.header_prefix()) {
            return Err(GuardError::unauthorized());
        }

        let body = parse_body(body).ok_or_else(GuardError::unauthorized)?;
        let content_type = request
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        let target = request
            .uri()
            .path_and_query()
            .map_or("", http::uri::PathAndQuery::as_str);

        let expected = sign_request(
            &self.credentials,
            request.method().as_str(),
            &body,
            content_type,
            target,
        )?;
        if bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
            Ok(())
        } else {
            Err(GuardError::unauthorized())
        }
    }
}

impl Guard for AccessGuard {
    fn name(&self) -> &'static str {
        "access"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut GuardContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, GuardResult<Response>> {
        Box::pin(async move {
            if self.skip_verification {
                tracing::debug!(request_id = %ctx.request_id(), "access verification skipped");
                return next.run(ctx, request).await;
            }

            let (request, bytes) = buffer_body(request).await;
            self.verify(&request, &bytes)?;
            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use bytes::Bytes;
    use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
    use http_body_util::Full;
    use serde_json::json;
    use turnstile_core::ErrorKind;

    const SIGNED_PUT: &str = "TESTtestkey:XwVtUJ2WSEj9UnEYP7uZwEKZ7lA=";

    fn credentials() -> AccessCredentials {
        AccessCredentials::new("TEST", "testkey", "testsecret")
    }

    fn create_request(
        method: &str,
        uri: &str,
        content_type: Option<&str>,
        authorization: Option<&str>,
        body: &str,
    ) -> Request {
        let mut builder = HttpRequest::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        if let Some(authorization) = authorization {
            builder = builder.header(AUTHORIZATION_HEADER, authorization);
        }
        builder.body(Full::new(Bytes::from(body.to_string()))).unwrap()
    }

    fn create_handler(
        _ctx: &mut GuardContext,
        _req: Request,
    ) -> BoxFuture<'static, GuardResult<Response>> {
        Box::pin(async {
            Ok(HttpResponse::builder()
                .status(StatusCode::OK)
                .body(Full::new(Bytes::from(r#"{"id":"1"}"#)))
                .unwrap())
        })
    }

    async fn run(guard: AccessGuard, request: Request) -> GuardResult<Response> {
        Pipeline::builder()
            .guard(guard)
            .build()
            .process(GuardContext::new(), request, create_handler)
            .await
    }

    #[test]
    fn test_known_signature() {
        let header = sign_request(
            &credentials(),
            "PUT",
            &json!({"name": "xyz"}),
            "application/json",
            "/items/1",
        )
        .unwrap();
        assert_eq!(header, SIGNED_PUT);
    }

    #[test]
    fn test_empty_body_and_missing_content_type() {
        let header = sign_request(&credentials(), "get", &json!({}), "", "/items?i=1").unwrap();
        assert_eq!(header, "TESTtestkey:ezcJbNo/LuMB+wH7IIXW4K2Puj0=");
    }

    #[tokio::test]
    async fn test_accepts_valid_signature() {
        let request = create_request(
            "PUT",
            "/items/1",
            Some("application/json"),
            Some(SIGNED_PUT),
            r#"{"name":"xyz"}"#,
        );
        let response = run(AccessGuard::new(credentials()), request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    fn stringify(value: &Value) -> String {
        let mut out = String::new();
        write_json(value, &mut out).unwrap();
        out
    }

    #[tokio::test]
    async fn test_accepts_signature_over_float_body() {
        let request = create_request(
            "PUT",
            "/items/1",
            Some("application/json"),
            Some("TESTtestkey:3x6cWwZUCH6RXcTWJVRcYkTCXBg="),
            r#"{"price":1.0}"#,
        );
        let response = run(AccessGuard::new(credentials()), request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let header = sign_request(
            &credentials(),
            "PUT",
            &json!({"price": 1}),
            "application/json",
            "/items/1",
        )
        .unwrap();
        assert_eq!(header, "TESTtestkey:3x6cWwZUCH6RXcTWJVRcYkTCXBg=");
    }

    #[test]
    fn test_numbers_use_ecmascript_form() {
        let cases = [
            ("1.0", "1"),
            ("-2.50", "-2.5"),
            ("-0.0", "0"),
            ("123.456", "123.456"),
            ("1e20", "100000000000000000000"),
            ("1e21", "1e+21"),
            ("1.5e300", "1.5e+300"),
            ("0.000001", "0.000001"),
            ("1.5e-7", "1.5e-7"),
            ("42", "42"),
            ("-9007199254740991", "-9007199254740991"),
            ("12345678901234567890", "12345678901234567000"),
        ];
        for (raw, expected) in cases {
            let value: Value = serde_json::from_str(raw).unwrap();
            assert_eq!(stringify(&value), expected, "{raw}");
        }
    }

    #[test]
    fn test_integer_keys_come_first() {
        let value: Value =
            serde_json::from_str(r#"{"b":1,"10":2,"a":[true,null],"2":"x","02":3}"#).unwrap();
        assert_eq!(
            stringify(&value),
            r#"{"2":"x","10":2,"b":1,"a":[true,null],"02":3}"#
        );
    }

    #[test]
    fn test_strings_are_escaped() {
        let value = json!({"note": "line\nbreak \"quoted\" \u{1f}"});
        assert_eq!(stringify(&value), r#"{"note":"line\nbreak \"quoted\" \u001f"}"#);
    }

    #[tokio::test]
    async fn test_body_is_reserialized_compactly() {
        let request = create_request(
            "PUT",
            "/items/1",
            Some("application/json"),
            Some(SIGNED_PUT),
            "{ \"name\" : \"xyz\" }\n",
        );
        assert!(run(AccessGuard::new(credentials()), request).await.is_ok());
    }

    #[tokio::test]
    async fn test_rejects_tampered_requests() {
        let cases = [
            ("PUT", "/items/1", Some("application/json"), r#"{"name":"yzx"}"#),
            ("POST", "/items/1", Some("application/json"), r#"{"name":"xyz"}"#),
            ("PUT", "/items/2", Some("application/json"), r#"{"name":"xyz"}"#),
            ("PUT", "/items/1?x=1", Some("application/json"), r#"{"name":"xyz"}"#),
            ("PUT", "/items/1", Some("application/jsom"), r#"{"name":"xyz"}"#),
            ("PUT", "/items/1", None, r#"{"name":"xyz"}"#),
        ];
        for (method, uri, content_type, body) in cases {
            let request = create_request(method, uri, content_type, Some(SIGNED_PUT), body);
            let error = run(AccessGuard::new(credentials()), request).await.unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Unauthorized, "{method} {uri} {content_type:?}");
            assert_eq!(error.message(), "Unauthorized");
        }
    }

    #[tokio::test]
    async fn test_rejects_missing_or_foreign_header() {
        for authorization in [None, Some("OTHERkey:XwVtUJ2WSEj9UnEYP7uZwEKZ7lA="), Some("TESTtestkey:")] {
            let request = create_request(
                "PUT",
                "/items/1",
                Some("application/json"),
                authorization,
                r#"{"name":"xyz"}"#,
            );
            let error = run(AccessGuard::new(credentials()), request).await.unwrap_err();
            assert_eq!(error, GuardError::unauthorized());
        }
    }

    #[tokio::test]
    async fn test_rejects_non_json_body() {
        let request = create_request(
            "PUT",
            "/items/1",
            Some("text/plain"),
            Some(SIGNED_PUT),
            "name=xyz",
        );
        let error = run(AccessGuard::new(credentials()), request).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_skip_verification() {
        let request = create_request("PUT", "/items/1", None, None, "");
        let guard = AccessGuard::new(credentials()).skip_verification(true);
        assert!(run(guard, request).await.is_ok());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", AccessGuard::new(credentials()));
        assert!(!debug.contains("testsecret"));
    }
}
