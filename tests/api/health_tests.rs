//! Health Check API Tests

use axum::http::StatusCode;
use axum_test::TestServer;

use crate::common::TestApp;

fn server() -> (TestServer, TestApp) {
    let app = TestApp::new();
    let server = TestServer::new(app.router.clone()).unwrap();
    (server, app)
}

#[tokio::test]
async fn test_health_check_returns_ok() {
    let (server, _app) = server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_liveness_ignores_database() {
    let (server, _app) = server();

    let response = server.get("/health/live").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "alive");
}

#[tokio::test]
async fn test_readiness_reports_unreachable_database() {
    let (server, app) = server();
    let _conn = app.connect(1);

    let response = server.get("/health/ready").await;

    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json();
    assert_eq!(body["checks"]["database"]["status"], "unhealthy");
    assert_eq!(body["checks"]["relay"]["active_connections"], 1);
}

#[tokio::test]
async fn test_metrics_endpoint_is_text() {
    let (server, _app) = server();

    let response = server.get("/metrics").await;

    response.assert_status_ok();
}
