//! JSON body parsing.
//!
//! The body parser stage decodes JSON request bodies once, before any
//! handler runs, and attaches the result as a [`ParsedBody`] extension.
//! Malformed bodies fail here, so no route handler ever sees them.
//! Handlers read the value through the [`JsonPayload`] extractor.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::collaborators::FeaturePayload;
use crate::config::SecurityConfig;
use crate::error::GatewayError;

/// Limits applied by the body parser.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimits {
    pub max_bytes: usize,
    /// Only objects and arrays are accepted at the top level.
    pub strict: bool,
}

impl BodyLimits {
    pub fn from_config(config: &SecurityConfig) -> Self {
        Self {
            max_bytes: config.max_body_size,
            strict: config.strict_validation,
        }
    }
}

/// Decoded JSON request body.
#[derive(Debug, Clone)]
pub struct ParsedBody(pub Value);

fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime == "application/json" || (mime.contains('/') && mime.ends_with("+json"))
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Body parser stage.
///
/// Requests without a JSON content type pass through untouched. The raw
/// bytes are forwarded downstream alongside the parsed value.
pub async fn parse_json_body(
    State(limits): State<BodyLimits>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, GatewayError> {
    if !is_json(request.headers()) {
        return Ok(next.run(request).await);
    }

    let too_large = GatewayError::PayloadTooLarge { limit: limits.max_bytes };
    if declared_length(request.headers()).is_some_and(|len| len > limits.max_bytes) {
        return Err(too_large);
    }

    let (mut parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, limits.max_bytes).await.map_err(|e| {
        tracing::debug!(error = %e, "Failed to read request body");
        too_large
    })?;

    if !bytes.is_empty() {
        let value: Value = serde_json::from_slice(&bytes).map_err(|e| {
            tracing::debug!(error = %e, "Rejected malformed JSON body");
            GatewayError::Validation("Request body is not valid JSON".to_string())
        })?;

        if limits.strict && !(value.is_object() || value.is_array()) {
            return Err(GatewayError::Validation(
                "JSON body must be an object or an array".to_string(),
            ));
        }

        parts.extensions.insert(ParsedBody(value));
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

/// Extractor for a parsed and validated feature payload.
#[derive(Debug)]
pub struct JsonPayload<T>(pub T);

impl<S, T> FromRequestParts<S> for JsonPayload<T>
where
    S: Send + Sync,
    T: FeaturePayload,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(ParsedBody(value)) = parts.extensions.get::<ParsedBody>() else {
            return Err(GatewayError::Validation("Expected a JSON request body".to_string()));
        };

        let payload = T::deserialize(value).map_err(|e| {
            tracing::debug!(feature = %T::FEATURE, error = %e, "Payload does not match schema");
            GatewayError::Validation(format!(
                "Request payload does not match the {} schema",
                T::FEATURE
            ))
        })?;

        payload.validate().map_err(GatewayError::Validation)?;

        Ok(Self(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, middleware, routing::post, Router};
    use tower::ServiceExt;

    use crate::error::Failure;

    fn app(strict: bool) -> Router {
        let limits = BodyLimits { max_bytes: 64, strict };
        Router::new()
            .route(
                "/",
                post(|request: Request<Body>| async move {
                    match request.extensions().get::<ParsedBody>() {
                        Some(ParsedBody(v)) => v.to_string(),
                        None => "none".to_string(),
                    }
                }),
            )
            .layer(middleware::from_fn_with_state(limits, parse_json_body))
    }

    fn post_body(content_type: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", content_type)
            .body(Body::from(body))
            .unwrap()
    }

    async fn text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_json_content_types() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "application/json; charset=utf-8".parse().unwrap());
        assert!(is_json(&headers));

        headers.insert(header::CONTENT_TYPE, "application/merge-patch+json".parse().unwrap());
        assert!(is_json(&headers));

        headers.insert(header::CONTENT_TYPE, "text/plain".parse().unwrap());
        assert!(!is_json(&headers));
    }

    #[tokio::test]
    async fn test_valid_json_attached() {
        let response = app(true)
            .oneshot(post_body("application/json", r#"{"a":1}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_malformed_json_never_reaches_handler() {
        let response = app(true)
            .oneshot(post_body("application/json", r#"{"a":"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.extensions().get::<Failure>().unwrap().code, "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn test_non_json_passes_through() {
        let response = app(true)
            .oneshot(post_body("text/plain", "{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "none");
    }

    #[tokio::test]
    async fn test_strict_rejects_scalars() {
        let response = app(true).oneshot(post_body("application/json", "42")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app(false).oneshot(post_body("application/json", "42")).await.unwrap();
        assert_eq!(text(response).await, "42");
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let big = "[\"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\"]";
        let response = app(true).oneshot(post_body("application/json", big)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_empty_json_body_leaves_no_value() {
        let response = app(true).oneshot(post_body("application/json", "")).await.unwrap();
        assert_eq!(text(response).await, "none");
    }
}
