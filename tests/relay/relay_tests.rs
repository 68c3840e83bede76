//! Relay scenarios across several connections

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use chat_relay::domain::{RoomId, UserStatus};
use chat_relay::presentation::websocket::{ClientEvent, ConnectionState, RelayError, ServerEvent};

use crate::common::{
    drain, event_names, identity, is_member, relay_with, BrokenMessages, InMemoryMessages,
};

fn event(frame: &str) -> ClientEvent {
    ClientEvent::parse(frame).unwrap()
}

fn general() -> RoomId {
    RoomId::from("general")
}

#[tokio::test]
async fn test_message_reaches_every_member_including_sender() {
    let store = Arc::new(InMemoryMessages::new());
    let relay = relay_with(store.clone());
    let mut a = relay.connect(identity(1, "ana"));
    let mut b = relay.connect(identity(2, "ben"));
    let mut outsider = relay.connect(identity(3, "cy"));

    for conn in [&a, &b] {
        relay
            .dispatch(conn.id, event(r#"{"event":"join_channel","data":"10"}"#))
            .await
            .unwrap();
    }
    relay
        .dispatch(
            a.id,
            event(r#"{"event":"send_message","data":{"content":"hi","channelId":"10","id":"client-made"}}"#),
        )
        .await
        .unwrap();

    let stored = store.stored();
    assert_eq!(stored.len(), 1);

    for events in [drain(&mut a), drain(&mut b)] {
        assert_eq!(event_names(&events), vec!["receive_message"]);
        match events[0].as_ref() {
            ServerEvent::ReceiveMessage(m) => {
                assert_eq!(m.content, "hi");
                assert_eq!(m.author.id, "1");
                assert_eq!(m.author.username, "ana");
                assert_eq!(m.id, stored[0].id.to_string());
                assert_ne!(m.id, "client-made");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
    assert!(drain(&mut outsider).is_empty());
}

#[tokio::test]
async fn test_typing_skips_sender_and_other_rooms() {
    let relay = relay_with(Arc::new(InMemoryMessages::new()));
    let mut a = relay.connect(identity(1, "ana"));
    let mut b = relay.connect(identity(2, "ben"));
    let mut c = relay.connect(identity(3, "cy"));

    relay.join(a.id, &general()).unwrap();
    relay.join(b.id, &general()).unwrap();
    relay.join(c.id, &RoomId::from("random")).unwrap();

    relay
        .dispatch(b.id, event(r#"{"event":"typing","data":{"channelId":"general"}}"#))
        .await
        .unwrap();

    let received = drain(&mut a);
    assert_eq!(event_names(&received), vec!["user_typing"]);
    let frame: serde_json::Value = serde_json::from_str(&received[0].to_frame().unwrap()).unwrap();
    assert_eq!(
        frame["data"],
        serde_json::json!({ "userId": "2", "username": "ben", "channelId": "general" })
    );
    assert!(drain(&mut b).is_empty());
    assert!(drain(&mut c).is_empty());
}

#[tokio::test]
async fn test_join_is_idempotent_and_leave_stops_delivery() {
    let relay = relay_with(Arc::new(InMemoryMessages::new()));
    let a = relay.connect(identity(1, "ana"));
    let mut b = relay.connect(identity(2, "ben"));

    relay.join(b.id, &general()).unwrap();
    relay.join(b.id, &general()).unwrap();
    relay.join(a.id, &general()).unwrap();
    assert_eq!(relay.members_of(&general()).len(), 2);
    assert_eq!(relay.rooms_of(b.id), vec![general()]);

    relay.leave(b.id, &general()).unwrap();
    relay.typing(a.id, &general()).unwrap();
    assert!(drain(&mut b).is_empty());

    // Leaving a room twice is a no-op.
    relay.leave(b.id, &general()).unwrap();

    relay.join(b.id, &general()).unwrap();
    relay.typing(a.id, &general()).unwrap();
    assert_eq!(event_names(&drain(&mut b)), vec!["user_typing"]);
}

#[tokio::test]
async fn test_failed_persistence_only_tells_sender() {
    let relay = relay_with(Arc::new(BrokenMessages::failing()));
    let mut a = relay.connect(identity(1, "ana"));
    let mut b = relay.connect(identity(2, "ben"));
    relay.join(a.id, &RoomId::from(10)).unwrap();
    relay.join(b.id, &RoomId::from(10)).unwrap();

    let err = relay
        .dispatch(a.id, event(r#"{"event":"send_message","data":{"content":"hi","channelId":10}}"#))
        .await
        .unwrap_err();

    assert_eq!(err, RelayError::PersistenceFailed);
    assert_eq!(event_names(&drain(&mut a)), vec!["message_error"]);
    assert!(drain(&mut b).is_empty());
}

#[tokio::test]
async fn test_slow_persistence_times_out_as_failure() {
    let relay = relay_with(Arc::new(BrokenMessages::slow(Duration::from_secs(5))));
    let mut a = relay.connect(identity(1, "ana"));
    let mut b = relay.connect(identity(2, "ben"));
    relay.join(a.id, &RoomId::from(10)).unwrap();
    relay.join(b.id, &RoomId::from(10)).unwrap();

    let started = std::time::Instant::now();
    let err = relay
        .dispatch(a.id, event(r#"{"event":"send_message","data":{"content":"hi","channelId":"10"}}"#))
        .await
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(err, RelayError::PersistenceFailed);
    let events = drain(&mut a);
    assert_eq!(
        events[0].as_ref(),
        &ServerEvent::MessageError {
            message: "Message could not be sent".into()
        }
    );
    assert!(drain(&mut b).is_empty());
}

#[tokio::test]
async fn test_slow_save_does_not_block_other_rooms() {
    let relay = relay_with(Arc::new(BrokenMessages::slow(Duration::from_millis(150))));
    let a = relay.connect(identity(1, "ana"));
    let b = relay.connect(identity(2, "ben"));
    let mut c = relay.connect(identity(3, "cy"));
    relay.join(a.id, &RoomId::from(10)).unwrap();
    relay.join(b.id, &general()).unwrap();
    relay.join(c.id, &general()).unwrap();

    let sender = relay.clone();
    let pending = tokio::spawn(async move {
        sender
            .dispatch(a.id, event(r#"{"event":"send_message","data":{"content":"hi","channelId":"10"}}"#))
            .await
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    relay.typing(b.id, &general()).unwrap();
    assert_eq!(event_names(&drain(&mut c)), vec!["user_typing"]);
    assert!(!pending.is_finished());

    assert!(pending.await.unwrap().is_err());
}

#[tokio::test]
async fn test_status_update_is_validated_and_broadcast() {
    let relay = relay_with(Arc::new(InMemoryMessages::new()));
    let mut a = relay.connect(identity(1, "ana"));
    let mut b = relay.connect(identity(2, "ben"));

    let err = relay
        .dispatch(a.id, event(r#"{"event":"update_status","data":"busy"}"#))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "invalid_status");
    assert_eq!(relay.presence_of(1), UserStatus::Online);
    assert!(drain(&mut b).is_empty());

    relay
        .dispatch(a.id, event(r#"{"event":"update_status","data":"dnd"}"#))
        .await
        .unwrap();
    assert_eq!(relay.presence_of(1), UserStatus::Dnd);
    for conn in [&mut a, &mut b] {
        let events = drain(conn);
        assert_eq!(event_names(&events), vec!["status_updated"]);
    }
}

#[tokio::test]
async fn test_notification_reaches_only_recipient_connections() {
    let relay = relay_with(Arc::new(InMemoryMessages::new()));
    let a = relay.connect(identity(1, "ana"));
    let mut b_phone = relay.connect(identity(2, "ben"));
    let mut b_laptop = relay.connect(identity(2, "ben"));
    let mut c = relay.connect(identity(3, "cy"));

    relay
        .dispatch(
            a.id,
            event(r#"{"event":"send_notification","data":{"recipientId":"2","message":{"text":"ping"}}}"#),
        )
        .await
        .unwrap();
    // Offline and unparseable recipients are dropped without error.
    relay
        .dispatch(a.id, event(r#"{"event":"send_notification","data":{"recipientId":"99","message":"x"}}"#))
        .await
        .unwrap();
    relay
        .dispatch(a.id, event(r#"{"event":"send_notification","data":{"recipientId":"nobody","message":"x"}}"#))
        .await
        .unwrap();

    assert_eq!(event_names(&drain(&mut b_phone)), vec!["receive_notification"]);
    assert_eq!(event_names(&drain(&mut b_laptop)), vec!["receive_notification"]);
    assert!(drain(&mut c).is_empty());
}

#[tokio::test]
async fn test_disconnect_clears_every_room() {
    let relay = relay_with(Arc::new(InMemoryMessages::new()));
    let a = relay.connect(identity(1, "ana"));
    let b = relay.connect(identity(2, "ben"));
    relay.join(a.id, &general()).unwrap();
    relay.join(a.id, &RoomId::from(10)).unwrap();
    relay.join(b.id, &general()).unwrap();

    assert!(relay.disconnect(a.id));
    assert!(!relay.disconnect(a.id));

    assert!(!is_member(&relay, "general", a.id));
    assert!(!is_member(&relay, "10", a.id));
    assert!(is_member(&relay, "general", b.id));
    assert_eq!(relay.room_count(), 1);
    assert_eq!(relay.state_of(a.id), ConnectionState::Disconnected);
    assert_eq!(relay.presence_of(1), UserStatus::Offline);

    let err = relay
        .dispatch(a.id, event(r#"{"event":"join_channel","data":"general"}"#))
        .await
        .unwrap_err();
    assert_eq!(err, RelayError::Disconnected);
    assert_eq!(relay.members_of(&general()), vec![b.id]);
}

#[tokio::test]
async fn test_first_event_activates_connection() {
    let relay = relay_with(Arc::new(InMemoryMessages::new()));
    let a = relay.connect(identity(1, "ana"));
    assert_eq!(relay.state_of(a.id), ConnectionState::Authenticated);

    relay
        .dispatch(a.id, event(r#"{"event":"join_channel","data":"general"}"#))
        .await
        .unwrap();

    assert_eq!(relay.state_of(a.id), ConnectionState::Active);
}

#[test]
fn test_unknown_event_is_invalid() {
    let err = ClientEvent::parse(r#"{"event":"self_destruct","data":{}}"#).unwrap_err();
    assert_eq!(err.kind(), "invalid_event");
}

#[tokio::test]
async fn test_disconnect_while_failing_save_is_pending() {
    let relay = relay_with(Arc::new(BrokenMessages::slow(Duration::from_millis(50))));
    let mut a = relay.connect(identity(1, "ana"));
    let mut b = relay.connect(identity(2, "ben"));
    relay.join(a.id, &RoomId::from(10)).unwrap();
    relay.join(b.id, &RoomId::from(10)).unwrap();

    let sending = tokio::spawn({
        let relay = relay.clone();
        let id = a.id;
        async move {
            relay
                .dispatch(id, event(r#"{"event":"send_message","data":{"content":"hi","channelId":"10"}}"#))
                .await
        }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(relay.disconnect(a.id));

    let result = sending.await.unwrap();
    assert_eq!(result, Err(RelayError::PersistenceFailed));
    assert!(drain(&mut a).is_empty());
    assert!(drain(&mut b).is_empty());
    assert_eq!(relay.connection_count(), 1);
}

#[tokio::test]
async fn test_disconnect_while_save_is_pending_skips_departed_sender() {
    let store = Arc::new(InMemoryMessages::slow(Duration::from_millis(50)));
    let relay = relay_with(store.clone());
    let mut a = relay.connect(identity(1, "ana"));
    let mut b = relay.connect(identity(2, "ben"));
    relay.join(a.id, &RoomId::from(10)).unwrap();
    relay.join(b.id, &RoomId::from(10)).unwrap();

    let sending = tokio::spawn({
        let relay = relay.clone();
        let id = a.id;
        async move {
            relay
                .dispatch(id, event(r#"{"event":"send_message","data":{"content":"hi","channelId":"10"}}"#))
                .await
        }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(relay.disconnect(a.id));

    assert!(sending.await.unwrap().is_ok());
    assert_eq!(store.stored().len(), 1);
    assert!(drain(&mut a).is_empty());
    assert_eq!(event_names(&drain(&mut b)), vec!["receive_message"]);
    assert_eq!(relay.members_of(&RoomId::from(10)), vec![b.id]);
}

#[tokio::test]
async fn test_zero_padded_room_gets_rest_broadcasts() {
    let store = Arc::new(InMemoryMessages::new());
    let relay = relay_with(store.clone());
    let mut a = relay.connect(identity(1, "ana"));

    relay
        .dispatch(a.id, event(r#"{"event":"join_channel","data":"042"}"#))
        .await
        .unwrap();
    assert_eq!(relay.rooms_of(a.id), vec![RoomId::from(42)]);

    let seeded = store.seed(42, &identity(2, "ben"), "hello");
    assert_eq!(relay.broadcast_message_update(seeded), 1);
    assert_eq!(event_names(&drain(&mut a)), vec!["message_updated"]);
}
