//! Error handler stage.
//!
//! # Responsibilities
//! - Render every failure as the uniform JSON error body
//! - Log the internal detail of a failure server-side only
//! - Turn handler panics into ordinary 500 failures
//!
//! # Design Decisions
//! - Installed outermost, so failures raised by any earlier stage (rate
//!   limiter, body parser) reach it as well as handler failures
//! - Bare error responses from the framework (405, 408) carry no marker and
//!   no body; they are rendered from their status code
//! - Headers already on the failed response (Retry-After, rate-limit and
//!   CORS headers) are kept

use std::any::Any;

use axum::{
    body::Body,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{Failure, GatewayError};
use crate::http::request::{client_identity, request_id};
use crate::observability::metrics;

fn is_bare_error(response: &Response) -> bool {
    let status = response.status();
    (status.is_client_error() || status.is_server_error())
        && !response.headers().contains_key(header::CONTENT_TYPE)
}

/// Outermost stage: render failure markers into JSON error bodies.
pub async fn render_failures(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let client = client_identity(&request);
    let request_id = request_id(&request).map(str::to_string);

    let mut response = next.run(request).await;

    let failure = match response.extensions_mut().remove::<Failure>() {
        Some(failure) => failure,
        None if is_bare_error(&response) => Failure::from_status(response.status()),
        None => return response,
    };

    if failure.status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            client = %client,
            request_id = request_id.as_deref().unwrap_or("-"),
            status = failure.status.as_u16(),
            code = failure.code,
            detail = failure.detail.as_deref().unwrap_or(&failure.message),
            "Request failed"
        );
    } else {
        tracing::warn!(
            method = %method,
            path = %path,
            client = %client,
            request_id = request_id.as_deref().unwrap_or("-"),
            status = failure.status.as_u16(),
            code = failure.code,
            message = %failure.message,
            "Request rejected"
        );
    }
    metrics::record_failure(failure.code);

    let (mut parts, _) = response.into_parts();
    parts.status = failure.status;
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    let rendered = Json(failure.body()).into_response();
    Response::from_parts(parts, rendered.into_body())
}

/// Panic hook for the dispatch stage.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };

    GatewayError::Unexpected(format!("panic: {detail}")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::StatusCode,
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn json_of(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn app() -> Router {
        Router::new()
            .route(
                "/invalid",
                get(|| async { GatewayError::Validation("`title` is required".into()) }),
            )
            .route(
                "/upstream",
                get(|| async { GatewayError::Upstream("connection refused by 10.0.0.3".into()) }),
            )
            .route("/bare", get(|| async { StatusCode::REQUEST_TIMEOUT }))
            .route("/ok", get(|| async { "fine" }))
            .layer(middleware::from_fn(render_failures))
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_validation_rendered() {
        let response = app().oneshot(get_req("/invalid")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "application/json");

        let json = json_of(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "`title` is required");
        assert_eq!(json["code"], "VALIDATION_FAILED");
        assert_eq!(json["statusCode"], 400);
    }

    #[tokio::test]
    async fn test_upstream_detail_not_leaked() {
        let response = app().oneshot(get_req("/upstream")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let json = json_of(response).await;
        assert_eq!(json["code"], "UPSTREAM_FAILURE");
        assert!(!json.to_string().contains("10.0.0.3"));
    }

    #[tokio::test]
    async fn test_bare_status_rendered() {
        let response = app().oneshot(get_req("/bare")).await.unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(json_of(response).await["code"], "REQUEST_TIMEOUT");
    }

    #[tokio::test]
    async fn test_unmatched_path_rendered() {
        let response = app().oneshot(get_req("/missing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_of(response).await["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_success_untouched() {
        let response = app().oneshot(get_req("/ok")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), 64).await.unwrap();
        assert_eq!(&bytes[..], b"fine");
    }

    #[test]
    fn test_panic_payload_becomes_internal_error() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let failure = response.extensions().get::<Failure>().unwrap();
        assert_eq!(failure.code, "INTERNAL_ERROR");
        assert!(failure.detail.as_deref().unwrap().contains("boom"));
        assert!(!failure.message.contains("boom"));
    }
}
