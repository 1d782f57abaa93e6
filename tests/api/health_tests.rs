//! Health and Metrics Endpoint Tests

use axum::http::StatusCode;
use serde_json::Value;

use crate::common::TestApp;

#[tokio::test]
async fn test_health_check_returns_ok() {
    let app = TestApp::new();

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_liveness() {
    let app = TestApp::new();

    let body: Value = app.server.get("/health/live").await.json();

    assert_eq!(body["status"], "alive");
}

#[tokio::test]
async fn test_readiness_with_in_memory_backends() {
    let app = TestApp::new();

    let response = app.server.get("/health/ready").await;

    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["database"]["message"], "in-memory");
    assert_eq!(body["checks"]["sessions"]["message"], "in-memory");
}

#[tokio::test]
async fn test_metrics_use_route_templates() {
    let app = TestApp::new();
    app.server.get("/api/tweets/123").await;

    let response = app.server.get("/metrics").await;

    response.assert_status_ok();
    let text = response.text();
    assert!(text.contains("chirp_server_http_requests_total"));
    assert!(text.contains(r#"path="/api/tweets/{id}""#));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new();

    app.server
        .get("/api/nope")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
