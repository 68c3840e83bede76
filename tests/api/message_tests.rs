//! Message history, edit, delete and reaction routes

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use chat_relay::presentation::websocket::ServerEvent;

use crate::common::{drain, event_names, identity, json_body, token_for, TestApp};

#[tokio::test]
async fn test_history_is_newest_first_and_limited() {
    let app = TestApp::new();
    let author = identity(1, "ana");
    let first = app.messages.seed(10, &author, "one");
    let second = app.messages.seed(10, &author, "two");
    app.messages.seed(11, &author, "elsewhere");

    let response = app
        .get_auth("/api/v1/channels/10/messages", &token_for(1))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let ids: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec![second.id.to_string(), first.id.to_string()]);

    let response = app
        .get_auth("/api/v1/channels/10/messages?limit=1", &token_for(1))
        .await;
    let body = json_body(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["content"], "two");
    assert_eq!(body[0]["author"]["username"], "ana");
}

#[tokio::test]
async fn test_edit_marks_edited_and_notifies_room() {
    let app = TestApp::new();
    let message = app.messages.seed(10, &identity(1, "ana"), "helo");
    let mut member = app.connect(2);
    app.relay.join(member.id, &"10".into()).unwrap();

    let response = app
        .send_json_auth(
            "PATCH",
            &format!("/api/v1/messages/{}", message.id),
            json!({ "content": "hello" }),
            &token_for(1),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["content"], "hello");
    assert_eq!(body["edited"], true);

    let events = drain(&mut member);
    assert_eq!(event_names(&events), vec!["message_updated"]);
    match events[0].as_ref() {
        ServerEvent::MessageUpdated(m) => {
            assert_eq!(m.id, message.id.to_string());
            assert!(m.edited);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_only_author_may_edit() {
    let app = TestApp::new();
    let message = app.messages.seed(10, &identity(1, "ana"), "mine");

    let response = app
        .send_json_auth(
            "PATCH",
            &format!("/api/v1/messages/{}", message.id),
            json!({ "content": "yours now" }),
            &token_for(2),
        )
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.messages.stored()[0].content, "mine");
}

#[tokio::test]
async fn test_delete_notifies_room() {
    let app = TestApp::new();
    let message = app.messages.seed(10, &identity(1, "ana"), "bye");
    let mut member = app.connect(2);
    app.relay.join(member.id, &"10".into()).unwrap();

    let response = app
        .send_json_auth(
            "DELETE",
            &format!("/api/v1/messages/{}", message.id),
            json!({}),
            &token_for(1),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(app.messages.stored().is_empty());

    let events = drain(&mut member);
    let frame: serde_json::Value = serde_json::from_str(&events[0].to_frame().unwrap()).unwrap();
    assert_eq!(
        frame,
        json!({
            "event": "message_deleted",
            "data": { "id": message.id.to_string(), "channelId": "10" }
        })
    );
}

#[tokio::test]
async fn test_reactions_group_by_emoji() {
    let app = TestApp::new();
    let message = app.messages.seed(10, &identity(1, "ana"), "react");
    let uri = format!("/api/v1/messages/{}/reactions", message.id);

    app.send_json_auth("POST", &uri, json!({ "emoji": "👍" }), &token_for(1))
        .await;
    // Second identical reaction is a no-op.
    app.send_json_auth("POST", &uri, json!({ "emoji": "👍" }), &token_for(1))
        .await;
    let response = app
        .send_json_auth("POST", &uri, json!({ "emoji": "👍" }), &token_for(2))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!([{ "emoji": "👍", "users": ["1", "2"] }])
    );

    app.send_json_auth("DELETE", &uri, json!({ "emoji": "👍" }), &token_for(1))
        .await;
    let response = app
        .send_json_auth("DELETE", &uri, json!({ "emoji": "👍" }), &token_for(2))
        .await;
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn test_empty_edit_is_rejected() {
    let app = TestApp::new();
    let message = app.messages.seed(10, &identity(1, "ana"), "keep");

    let response = app
        .send_json_auth(
            "PATCH",
            &format!("/api/v1/messages/{}", message.id),
            json!({ "content": "" }),
            &token_for(1),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
