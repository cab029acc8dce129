#![allow(dead_code)]

use std::path::PathBuf;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use http_body_util::BodyExt;
use tower::ServiceExt;

use reelgen_server::build_router;
use reelgen_server::config::ServerConfig;
use reelgen_server::state::AppState;

/// Build a test `ServerConfig` pointed at the given provider URL.
pub fn test_config(provider_base_url: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        provider_base_url: provider_base_url.to_string(),
        provider_api_key: "test-key".to_string(),
        static_dir: PathBuf::from("public"),
        request_timeout_secs: 30,
    }
}

/// Build the full application router, so tests exercise the same middleware
/// stack that production uses.
pub fn build_test_app(provider_base_url: &str) -> Router {
    build_router(AppState::new(test_config(provider_base_url)))
}

pub fn build_test_app_with_config(config: ServerConfig) -> Router {
    build_router(AppState::new(config))
}

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
