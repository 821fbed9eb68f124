//! Route handlers.
//!
//! # Data Flow
//! ```text
//! RouteTable::standard()
//!     → mount() (one route group per entry)
//!         HealthCheck   → health.rs
//!         StaticAssets  → assets.rs (ServeDir)
//!         Feature(..)   → features.rs (validate + collaborator)
//!         ApiDocs       → docs.rs (OpenAPI document + Swagger UI)
//!     → fallback: structured 404
//! ```

pub mod assets;
pub mod docs;
pub mod features;
pub mod health;

use std::sync::Arc;

use axum::{
    http::{Method, Uri},
    routing::get,
    Router,
};

use crate::collaborators::CollaboratorRegistry;
use crate::config::StaticAssetsConfig;
use crate::error::GatewayError;
use crate::routing::{RouteGroup, RouteTable};

async fn not_found(method: Method, uri: Uri) -> GatewayError {
    GatewayError::NotFound(format!("Cannot {method} {}", uri.path()))
}

/// Build the dispatch router from the route table.
pub fn mount(
    table: &RouteTable,
    registry: Arc<CollaboratorRegistry>,
    assets: &StaticAssetsConfig,
) -> Router {
    let mut router = Router::new();

    for entry in table.entries() {
        let group = match entry.group() {
            RouteGroup::HealthCheck => {
                Router::new().route(entry.prefix(), get(health::check))
            }
            RouteGroup::StaticAssets => assets::router(entry.prefix(), assets),
            RouteGroup::Feature(feature) => Router::new()
                .route(entry.prefix(), features::route(feature))
                .with_state(registry.clone()),
            RouteGroup::ApiDocs => docs::router(entry.prefix(), table),
        };
        router = router.merge(group);
    }

    router.fallback(not_found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::{Request, StatusCode}};
    use tower::ServiceExt;

    fn app() -> Router {
        mount(
            &RouteTable::standard(),
            Arc::new(CollaboratorRegistry::new()),
            &StaticAssetsConfig::default(),
        )
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_check_mounted() {
        let response = app().oneshot(request("GET", "/health-check")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_docs_mounted() {
        let response = app().oneshot(request("GET", "/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app().oneshot(request("GET", "/swagger.json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_feature_routes_are_post_only() {
        let response = app().oneshot(request("GET", "/word-generator")).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let response = app().oneshot(request("GET", "/does-not-exist")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<crate::error::Failure>().is_some());
    }
}
