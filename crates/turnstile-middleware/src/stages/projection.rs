//! Projection guard.
//!
//! Merges an ordered list of field names from the query string under
//! `select`. Accepts repeated keys (`p=id&p=name`), `p[]` keys, or a JSON
//! array string (`p=["id","name"]`).

use super::expression::lookup;
use crate::context::GuardContext;
use crate::middleware::{BoxFuture, Guard, Next};
use crate::sections::parse_query;
use crate::types::{Request, Response};
use serde_json::Value;
use turnstile_core::{GuardError, GuardResult, ProjectionConfig};

/// Message of every projection rejection.
pub const INVALID_PROJECTION: &str = "Invalid projection expression";

/// Guard deriving the `select` option from the query string.
#[derive(Debug, Clone, Default)]
pub struct ProjectionGuard {
    config: ProjectionConfig,
}

impl ProjectionGuard {
    /// Creates a projection guard from a configuration record.
    #[must_use]
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }
}

impl Guard for ProjectionGuard {
    fn name(&self) -> &'static str {
        "projection"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut GuardContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, GuardResult<Response>> {
        Box::pin(async move {
            let query = parse_query(request.uri().query());
            if let Some(raw) = lookup(&query, &self.config.projection_name) {
                let select =
                    parse_names(raw).ok_or_else(|| GuardError::bad_request(INVALID_PROJECTION))?;
                ctx.options_mut().merge_select(select);
            }
            next.run(ctx, request).await
        })
    }
}

fn parse_names(raw: &Value) -> Option<Vec<String>> {
    match raw {
        Value::Array(_) => serde_json::from_value(raw.clone()).ok(),
        Value::String(text) => serde_json::from_str(text).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_array_passes_unchanged() {
        assert_eq!(
            parse_names(&json!(["id", "name"])),
            Some(vec!["id".to_string(), "name".to_string()])
        );
    }

    #[test]
    fn test_json_string() {
        assert_eq!(
            parse_names(&json!(r#"["name","id"]"#)),
            Some(vec!["name".to_string(), "id".to_string()])
        );
    }

    #[test]
    fn test_rejects_other_structures() {
        assert_eq!(parse_names(&json!("name")), None);
        assert_eq!(parse_names(&json!(r#"{"name":1}"#)), None);
        assert_eq!(parse_names(&json!([1, 2])), None);
        assert_eq!(parse_names(&json!({"0": "name"})), None);
    }

    #[tokio::test]
    async fn test_guard_merges_select() {
        use crate::pipeline::Pipeline;
        use bytes::Bytes;
        use http::{Request as HttpRequest, Response as HttpResponse};
        use http_body_util::Full;

        let pipeline = Pipeline::builder().guard(ProjectionGuard::default()).build();
        let request = HttpRequest::builder()
            .uri("/items?p=id&p=name")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let mut ctx = GuardContext::new();
        pipeline
            .process_with(&mut ctx, request, |_ctx, _req| {
                Box::pin(async { Ok(HttpResponse::new(Full::new(Bytes::new()))) })
            })
            .await
            .unwrap();

        assert_eq!(
            ctx.options().select.as_deref(),
            Some(&["id".to_string(), "name".to_string()][..])
        );
    }
}
