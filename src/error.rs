//! Client-facing failure taxonomy.
//!
//! Every failure a stage or handler raises is a [`GatewayError`]. Converting
//! it into a response does not render a body: it attaches a [`Failure`]
//! marker that the error handler stage turns into the uniform JSON body,
//! so there is exactly one place that writes error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Failures surfaced to clients.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// Malformed or invalid request payload.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Rate limit exceeded")]
    RateLimited { retry_after: u64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// A collaborator failed. The detail is logged, never returned.
    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Upstream timed out: {0}")]
    UpstreamTimeout(String),

    /// The feature has no collaborator configured.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Anything uncaught. The detail is logged, never returned.
    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code included in the error body.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Validation(_) => "VALIDATION_FAILED",
            GatewayError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            GatewayError::RateLimited { .. } => "RATE_LIMITED",
            GatewayError::NotFound(_) => "NOT_FOUND",
            GatewayError::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            GatewayError::Upstream(_) => "UPSTREAM_FAILURE",
            GatewayError::UpstreamTimeout(_) => "UPSTREAM_TIMEOUT",
            GatewayError::Unavailable(_) => "SERVICE_UNAVAILABLE",
            GatewayError::Unexpected(_) => "INTERNAL_ERROR",
        }
    }

    /// Split into the message clients see and the detail only the logs see.
    fn into_failure(self) -> Failure {
        let status = self.status();
        let code = self.code();
        let (message, detail) = match self {
            GatewayError::Validation(message) => (message, None),
            GatewayError::PayloadTooLarge { limit } => {
                (format!("Request body exceeds the {limit} byte limit"), None)
            }
            GatewayError::RateLimited { .. } => {
                ("Too many requests, please try again later.".to_string(), None)
            }
            GatewayError::NotFound(message) => (message, None),
            GatewayError::MethodNotAllowed => ("Method not allowed".to_string(), None),
            GatewayError::Upstream(detail) => {
                ("The upstream service failed to process the request".to_string(), Some(detail))
            }
            GatewayError::UpstreamTimeout(detail) => {
                ("The upstream service did not respond in time".to_string(), Some(detail))
            }
            GatewayError::Unavailable(message) => (message, None),
            GatewayError::Unexpected(detail) => {
                ("An unexpected error occurred".to_string(), Some(detail))
            }
        };

        Failure {
            status,
            code,
            message,
            detail,
        }
    }
}

/// Failure marker carried in response extensions until the error handler
/// renders it.
#[derive(Debug, Clone)]
pub struct Failure {
    pub status: StatusCode,
    pub code: &'static str,
    /// Safe to show to clients.
    pub message: String,
    /// Internal detail for server-side logs only.
    pub detail: Option<String>,
}

impl Failure {
    /// Describe an error response produced without a marker (framework
    /// rejections such as 405 or a request timeout).
    pub fn from_status(status: StatusCode) -> Self {
        let (code, message) = match status {
            StatusCode::NOT_FOUND => ("NOT_FOUND", "Not found"),
            StatusCode::METHOD_NOT_ALLOWED => ("METHOD_NOT_ALLOWED", "Method not allowed"),
            StatusCode::REQUEST_TIMEOUT => ("REQUEST_TIMEOUT", "Request timed out"),
            StatusCode::PAYLOAD_TOO_LARGE => ("PAYLOAD_TOO_LARGE", "Request body too large"),
            StatusCode::TOO_MANY_REQUESTS => {
                ("RATE_LIMITED", "Too many requests, please try again later.")
            }
            s if s.is_client_error() => ("BAD_REQUEST", "Bad request"),
            _ => ("INTERNAL_ERROR", "An unexpected error occurred"),
        };

        Self {
            status,
            code,
            message: message.to_string(),
            detail: None,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            success: false,
            message: self.message.clone(),
            code: self.code,
            status_code: self.status.as_u16(),
        }
    }
}

/// Uniform JSON error body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    pub code: &'static str,
    pub status_code: u16,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let retry_after = match &self {
            GatewayError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        };

        let failure = self.into_failure();
        let mut response = failure.status.into_response();

        if let Some(secs) = retry_after {
            if let Ok(val) = axum::http::HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(axum::http::header::RETRY_AFTER, val);
            }
        }

        response.extensions_mut().insert(failure);
        response
    }
}
