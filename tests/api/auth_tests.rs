//! Credential checks on the gateway handshake and the REST surface

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use crate::common::{json_body, token_for, TestApp};

#[tokio::test]
async fn test_gateway_without_token_is_missing_credential() {
    let app = TestApp::new();

    let response = app.get("/gateway").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["kind"], "missing_credential");
    assert_eq!(app.relay.connection_count(), 0);
}

#[tokio::test]
async fn test_gateway_with_bad_query_token_is_invalid_credential() {
    let app = TestApp::new();

    let response = app.get("/gateway?token=forged").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["kind"], "invalid_credential");
    assert_eq!(app.relay.connection_count(), 0);
}

#[tokio::test]
async fn test_gateway_with_bad_bearer_header_is_invalid_credential() {
    let app = TestApp::new();

    let response = app.get_auth("/gateway", "expired").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["kind"], "invalid_credential");
}

#[tokio::test]
async fn test_gateway_with_valid_token_requires_upgrade() {
    let app = TestApp::new();

    // Credential passes; a plain GET is not a websocket upgrade.
    let response = app.get(&format!("/gateway?token={}", token_for(3))).await;

    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.relay.connection_count(), 0);
}

#[tokio::test]
async fn test_rest_requires_authorization_header() {
    let app = TestApp::new();

    let response = app.get("/api/v1/users/@me").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["code"], 10003);
}

#[tokio::test]
async fn test_rest_rejects_expired_token() {
    let app = TestApp::new();

    let response = app.get_auth("/api/v1/users/@me", "expired").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Token expired");
}
