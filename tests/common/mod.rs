//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use office_gateway::collaborators::{Collaborator, CollaboratorError, Feature};
use office_gateway::config::GatewayConfig;

/// Defaults with a scratch asset directory holding `logo.png`.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.static_assets.dir = assets_dir().to_string_lossy().into_owned();
    config
}

pub fn assets_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("office-gateway-assets-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("logo.png"), b"not really a png").unwrap();
    dir
}

/// Answers with a fixed value and counts invocations.
#[derive(Clone)]
pub struct RecordingCollaborator {
    calls: Arc<AtomicUsize>,
    response: Value,
}

impl RecordingCollaborator {
    pub fn new(response: Value) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            response,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Collaborator for RecordingCollaborator {
    async fn invoke(&self, _feature: Feature, _payload: Value) -> Result<Value, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

/// Always fails with an internal-looking error message.
pub struct FailingCollaborator;

pub const INTERNAL_DETAIL: &str = "connection refused by 10.9.8.7:4000";

#[async_trait]
impl Collaborator for FailingCollaborator {
    async fn invoke(&self, _feature: Feature, _payload: Value) -> Result<Value, CollaboratorError> {
        Err(CollaboratorError::Upstream(INTERNAL_DETAIL.to_string()))
    }
}

pub struct PanickingCollaborator;

#[async_trait]
impl Collaborator for PanickingCollaborator {
    async fn invoke(&self, _feature: Feature, _payload: Value) -> Result<Value, CollaboratorError> {
        panic!("renderer exploded at {INTERNAL_DETAIL}");
    }
}

/// Takes longer than any test timeout.
pub struct SlowCollaborator(pub Duration);

#[async_trait]
impl Collaborator for SlowCollaborator {
    async fn invoke(&self, _feature: Feature, payload: Value) -> Result<Value, CollaboratorError> {
        tokio::time::sleep(self.0).await;
        Ok(payload)
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .unwrap()
}

/// Attach a socket peer, as the server does for real connections.
pub fn from_peer(mut request: Request<Body>, peer: &str) -> Request<Body> {
    let addr: SocketAddr = format!("{peer}:40000").parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

/// Arrive through the trusted proxy on behalf of `client`.
pub fn via_proxy(mut request: Request<Body>, forwarded_for: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert("x-forwarded-for", forwarded_for.parse().unwrap());
    from_peer(request, "10.0.0.1")
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn word_document() -> Value {
    json!({
        "title": "Quarterly report",
        "sections": [{ "heading": "Summary", "paragraphs": ["Revenue grew."] }]
    })
}

/// Start a fake collaborator service on an ephemeral port.
///
/// - `POST /ok` echoes the payload under `received`
/// - `POST /fail` answers 500
/// - `POST /slow` answers after three seconds
/// - `POST /text` answers with a non-JSON body
pub async fn start_mock_collaborator() -> SocketAddr {
    let app = Router::new()
        .route(
            "/ok",
            post(|Json(payload): Json<Value>| async move { Json(json!({ "received": payload })) }),
        )
        .route(
            "/fail",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "renderer crashed").into_response() }),
        )
        .route(
            "/slow",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!({ "late": true }))
            }),
        )
        .route("/text", post(|| async { "plain text" }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}
