//! Router-level tests that never reach the database
//!
//! The pool is lazy and points nowhere; every request here must be
//! answered before a query runs.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::{Request, StatusCode};
use axum::Router;
use breakroom_server::auth::{TokenService, NEW_TOKEN_HEADER};
use breakroom_server::config::{AppConfig, StorageConfig};
use breakroom_server::storage::MemoryStore;
use breakroom_server::{build_router, AppState};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

const SECRET: &str = "integration-secret-integration-secret";

fn config() -> AppConfig {
    let mut config = AppConfig::new(SECRET);
    config.public_origin = "http://localhost:5173".into();
    config.storage = StorageConfig {
        public_url: Some("https://cdn.example.com".into()),
        ..StorageConfig::default()
    };
    config
}

fn app(config: AppConfig) -> Router {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://breakroom@localhost:1/unused")
        .unwrap();
    let storage = Arc::new(MemoryStore::new(config.storage.clone()));
    build_router(Arc::new(AppState::new(pool, config, storage)))
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let response = app(config()).oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let response = app(config()).oneshot(get("/api/shortcuts")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "unauthorized");
    assert_eq!(body["message"], "Not authenticated");
}

#[tokio::test]
async fn garbage_bearer_token_is_rejected() {
    let request = Request::builder()
        .uri("/api/breakroom/layout")
        .header("authorization", "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let response = app(config()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["message"], "Invalid token");
}

#[tokio::test]
async fn token_signed_with_another_key_is_rejected() {
    let token = TokenService::new("some-other-key").issue("dana").unwrap();
    let request = Request::builder()
        .uri("/api/lyrics/songs")
        .header("cookie", format!("jwtToken={token}"))
        .body(Body::empty())
        .unwrap();
    let response = app(config()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(NEW_TOKEN_HEADER).is_none());
}

#[tokio::test]
async fn valid_session_is_refreshed() {
    let token = TokenService::new(SECRET).issue("dana").unwrap();
    let request = Request::builder()
        .uri("/api/health")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app(config()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let fresh = response.headers().get(NEW_TOKEN_HEADER).unwrap().to_str().unwrap();
    let claims = TokenService::new(SECRET).verify(fresh).unwrap();
    assert_eq!(claims.username, "dana");

    let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("jwtToken="));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn reporter_key_checked_when_configured() {
    let mut config = config();
    config.test_api_key = Some("reporter-key".into());

    let request = Request::builder()
        .method("POST")
        .uri("/api/test-results/runs")
        .header("content-type", "application/json")
        .header("x-api-key", "wrong")
        .body(Body::from(r#"{"platform": "web"}"#))
        .unwrap();
    let response = app(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["message"], "Invalid API key");
}

#[tokio::test]
async fn reporter_payload_validated_before_storage() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/test-results/runs")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"platform": "desktop"}"#))
        .unwrap();
    let response = app(config()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "validation_error");
}

#[tokio::test]
async fn unknown_api_path_is_json_404() {
    let response = app(config()).oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], "not_found");
}

#[tokio::test]
async fn legacy_uploads_redirect_to_storage() {
    let response = app(config())
        .oneshot(get("/uploads/profile_12.jpg"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        response.headers().get(LOCATION).unwrap(),
        "https://cdn.example.com/profiles/profile_12.jpg"
    );

    let response = app(config())
        .oneshot(get("/api/uploads/gallery/3/art.png"))
        .await
        .unwrap();
    assert_eq!(
        response.headers().get(LOCATION).unwrap(),
        "https://cdn.example.com/gallery/3/art.png"
    );

    let response = app(config()).oneshot(get("/api/uploads")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["message"], "File not found");
}

#[tokio::test]
async fn privacy_page_carries_open_graph_tags() {
    let dist = tempfile::tempdir().unwrap();
    std::fs::write(
        dist.path().join("index.html"),
        "<html><head><title>Prosaurus</title></head><body><div id=\"app\"></div></body></html>",
    )
    .unwrap();

    let mut config = config();
    config.dist_dir = dist.path().to_path_buf();

    let response = app(config).oneshot(get("/privacy")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(html.contains(r#"<meta property="og:title" content="Privacy Policy" />"#));
    assert!(html.contains(r#"<meta property="og:url" content="http://localhost:5173/privacy" />"#));
    assert!(html.contains("<title>Privacy Policy - Prosaurus</title>"));
    assert!(html.contains(r#"<div id="app"></div>"#));
}

#[tokio::test]
async fn unknown_page_serves_the_app_shell() {
    let dist = tempfile::tempdir().unwrap();
    std::fs::write(dist.path().join("index.html"), "<html>shell</html>").unwrap();

    let mut config = config();
    config.dist_dir = dist.path().to_path_buf();

    let response = app(config).oneshot(get("/breakroom/settings")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<html>shell</html>");
}

#[tokio::test]
async fn cors_preflight_allows_site_origin() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/shortcuts")
        .header("origin", "https://prosaurus.com")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let response = app(config()).oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "https://prosaurus.com"
    );
    assert_eq!(
        response.headers().get("access-control-allow-credentials").unwrap(),
        "true"
    );
}
