//! Request logging stage.
//!
//! Opens one span per request carrying the request id, client identity and
//! resolved route, and emits a single completion event with status and
//! latency. Events raised further down (handlers, collaborators) inherit
//! the span's fields.

use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

use crate::http::request::{client_identity, request_id};
use crate::observability::metrics;
use crate::routing::RouteTable;

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

pub async fn log_requests(
    State(table): State<Arc<RouteTable>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let started = Instant::now();
    let started_at_ms = unix_millis();

    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let route = table
        .resolve(&path)
        .map(|entry| entry.group().label())
        .unwrap_or("unmatched");

    let span = tracing::info_span!(
        "request",
        method = %method,
        path = %path,
        client = %client_identity(&request),
        request_id = request_id(&request).unwrap_or("-"),
        route,
    );

    let response = next.run(request).instrument(span.clone()).await;

    let status = response.status();
    let latency_ms = started.elapsed().as_millis() as u64;

    span.in_scope(|| {
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), started_at_ms, latency_ms, "Request completed");
        } else if status.is_client_error() {
            tracing::warn!(status = status.as_u16(), started_at_ms, latency_ms, "Request completed");
        } else {
            tracing::info!(status = status.as_u16(), started_at_ms, latency_ms, "Request completed");
        }
    });
    metrics::record_request(&method, status.as_u16(), route, started);

    response
}
