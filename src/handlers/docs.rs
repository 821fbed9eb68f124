//! API documentation.
//!
//! `GET /swagger.json` serves an OpenAPI 3 document assembled from the route
//! table; `GET /` serves a Swagger UI page that loads it.

use std::sync::Arc;

use axum::{extract::State, response::Html, routing::get, Json, Router};
use serde_json::{json, Map, Value};

use crate::collaborators::Feature;
use crate::routing::{RouteGroup, RouteTable};

pub const DOCUMENT_PATH: &str = "/swagger.json";

const SWAGGER_UI: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>Office Gateway API</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.ui = SwaggerUIBundle({ url: "/swagger.json", dom_id: "#swagger-ui" });
  </script>
</body>
</html>
"##;

fn envelope_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "success": { "type": "boolean" },
            "message": { "type": "string" },
            "responseObject": {},
            "statusCode": { "type": "integer" }
        }
    })
}

fn error_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "success": { "type": "boolean", "example": false },
            "message": { "type": "string" },
            "code": { "type": "string" },
            "statusCode": { "type": "integer" }
        }
    })
}

fn feature_request_schema(feature: Feature) -> Value {
    let string = json!({ "type": "string" });
    let strings = json!({ "type": "array", "items": { "type": "string" } });
    match feature {
        Feature::YoutubeTranscript => json!({
            "type": "object",
            "required": ["url"],
            "properties": { "url": string, "lang": string }
        }),
        Feature::WebPageReader => json!({
            "type": "object",
            "required": ["url"],
            "properties": { "url": string }
        }),
        Feature::PowerpointGenerator => json!({
            "type": "object",
            "required": ["title", "slides"],
            "properties": {
                "title": string,
                "slides": { "type": "array", "items": {
                    "type": "object",
                    "required": ["title"],
                    "properties": { "title": string, "content": string, "bullets": strings }
                }}
            }
        }),
        Feature::WordGenerator => json!({
            "type": "object",
            "required": ["title", "sections"],
            "properties": {
                "title": string,
                "sections": { "type": "array", "items": {
                    "type": "object",
                    "required": ["paragraphs"],
                    "properties": { "heading": string, "paragraphs": strings }
                }}
            }
        }),
        Feature::ExcelGenerator => json!({
            "type": "object",
            "required": ["title", "sheets"],
            "properties": {
                "title": string,
                "sheets": { "type": "array", "items": {
                    "type": "object",
                    "required": ["name", "columns"],
                    "properties": {
                        "name": string,
                        "columns": strings,
                        "rows": { "type": "array", "items": { "type": "array", "items": {} } }
                    }
                }}
            }
        }),
    }
}

fn json_response(description: &str, schema: &str) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": { "$ref": format!("#/components/schemas/{schema}") } } }
    })
}

/// Build the OpenAPI document for every entry in `table`.
pub fn openapi_document(table: &RouteTable) -> Value {
    let mut paths = Map::new();

    for entry in table.entries() {
        match entry.group() {
            RouteGroup::HealthCheck => {
                paths.insert(
                    entry.prefix().to_string(),
                    json!({ "get": {
                        "tags": ["Health Check"],
                        "summary": "Liveness check",
                        "responses": { "200": json_response("Service is healthy", "ServiceResponse") }
                    }}),
                );
            }
            RouteGroup::StaticAssets => {
                paths.insert(
                    format!("{}/{{file}}", entry.prefix()),
                    json!({ "get": {
                        "tags": ["Assets"],
                        "summary": "Static image asset",
                        "parameters": [{ "name": "file", "in": "path", "required": true, "schema": { "type": "string" } }],
                        "responses": {
                            "200": { "description": "File contents" },
                            "404": json_response("Asset not found", "ErrorResponse")
                        }
                    }}),
                );
            }
            RouteGroup::Feature(feature) => {
                paths.insert(
                    entry.prefix().to_string(),
                    json!({ "post": {
                        "tags": [feature.as_str()],
                        "summary": feature.success_message(),
                        "requestBody": {
                            "required": true,
                            "content": { "application/json": { "schema": feature_request_schema(feature) } }
                        },
                        "responses": {
                            "200": json_response(feature.success_message(), "ServiceResponse"),
                            "400": json_response("Invalid payload", "ErrorResponse"),
                            "429": json_response("Too many requests", "ErrorResponse"),
                            "502": json_response("Upstream failure", "ErrorResponse"),
                            "503": json_response("Feature not configured", "ErrorResponse")
                        }
                    }}),
                );
            }
            RouteGroup::ApiDocs => {
                paths.insert(
                    DOCUMENT_PATH.to_string(),
                    json!({ "get": {
                        "tags": ["Docs"],
                        "summary": "OpenAPI document",
                        "responses": { "200": { "description": "This document" } }
                    }}),
                );
            }
        }
    }

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Office Gateway API",
            "version": env!("CARGO_PKG_VERSION")
        },
        "paths": paths,
        "components": {
            "schemas": {
                "ServiceResponse": envelope_schema(),
                "ErrorResponse": error_schema()
            }
        }
    })
}

async fn document(State(doc): State<Arc<Value>>) -> Json<Value> {
    Json(doc.as_ref().clone())
}

async fn ui() -> Html<&'static str> {
    Html(SWAGGER_UI)
}

/// Docs routes mounted at `prefix` (normally `/`).
pub fn router(prefix: &str, table: &RouteTable) -> Router {
    let doc = Arc::new(openapi_document(table));
    let base = prefix.trim_end_matches('/');
    Router::new()
        .route(&format!("{base}{DOCUMENT_PATH}"), get(document))
        .route(if base.is_empty() { "/" } else { base }, get(ui))
        .with_state(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = openapi_document(&RouteTable::standard());
        let paths = doc["paths"].as_object().unwrap();

        assert!(paths.contains_key("/health-check"));
        assert!(paths.contains_key("/images/{file}"));
        assert!(paths.contains_key("/swagger.json"));
        for feature in Feature::ALL {
            assert!(paths[feature.path()]["post"].is_object(), "{feature} missing");
        }
    }

    #[tokio::test]
    async fn test_ui_page_loads_document() {
        let Html(page) = ui().await;
        assert!(page.contains(r##"dom_id: "#swagger-ui""##));
        assert!(page.contains(r#"url: "/swagger.json""#));
        assert!(page.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_word_generator_requires_title() {
        let doc = openapi_document(&RouteTable::standard());
        let schema = &doc["paths"]["/word-generator"]["post"]["requestBody"]["content"]
            ["application/json"]["schema"];
        assert_eq!(schema["required"], json!(["title", "sections"]));
    }
}
