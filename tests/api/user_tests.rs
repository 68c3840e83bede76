//! User and search routes that are decided before any database access

use axum::http::StatusCode;
use serde_json::json;
use test_case::test_case;

use chat_relay::domain::UserStatus;

use crate::common::{drain, token_for, TestApp};

#[tokio::test]
async fn test_invalid_status_is_rejected_and_presence_unchanged() {
    let app = TestApp::new();
    let mut watcher = app.connect(5);

    let response = app
        .send_json_auth(
            "PUT",
            "/api/v1/users/@me/status",
            json!({ "status": "busy" }),
            &token_for(5),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.relay.presence_of(5), UserStatus::Online);
    assert!(drain(&mut watcher).is_empty());
}

#[test_case("/api/v1/users/search?query=" ; "blank user search")]
#[test_case("/api/v1/users/search" ; "missing user search")]
#[test_case("/api/v1/servers/search?query=%20" ; "blank server search")]
#[test_case("/api/v1/channels/search?query=" ; "blank channel search")]
#[test_case("/api/v1/users/not-a-number" ; "non numeric user id")]
#[test_case("/api/v1/channels/12x" ; "non numeric channel id")]
#[test_case("/api/v1/channels/10/messages?before=abc" ; "non numeric cursor")]
#[tokio::test]
async fn test_bad_request(uri: &str) {
    let app = TestApp::new();

    let response = app.get_auth(uri, &token_for(1)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test_case("/api/v1/users/3/friends" ; "adding yourself as a friend")]
#[test_case("/api/v1/users/abc/friends" ; "non numeric friend id")]
#[test_case("/api/v1/servers/abc/invites" ; "non numeric invite server id")]
#[tokio::test]
async fn test_bad_post(uri: &str) {
    let app = TestApp::new();

    let response = app
        .send_json_auth("POST", uri, json!({}), &token_for(3))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_server_stats_rejects_non_numeric_id() {
    let app = TestApp::new();

    let response = app
        .get_auth("/api/v1/servers/general/stats", &token_for(1))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_membership_routes_require_auth() {
    let app = TestApp::new();

    let response = app.get("/api/v1/users/@me/friends").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
