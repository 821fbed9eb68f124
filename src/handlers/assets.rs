//! Static image assets.

use axum::{routing::any, Router};
use tower_http::services::ServeDir;

use crate::config::StaticAssetsConfig;
use crate::error::GatewayError;

async fn missing_asset() -> GatewayError {
    GatewayError::NotFound("Asset not found".to_string())
}

/// Serve files under `config.dir` at `prefix`.
pub fn router(prefix: &str, config: &StaticAssetsConfig) -> Router {
    let files = ServeDir::new(&config.dir).not_found_service(any(missing_asset));
    Router::new().nest_service(prefix, files)
}
