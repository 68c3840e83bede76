//! The gateway served on a real socket

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use chat_relay::presentation::websocket::Relay;

use crate::common::{token_for, TestApp};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn serve(app: &TestApp) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn next_frame(client: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .expect("frame within deadline")
            .expect("socket open")
            .unwrap();
        if msg.is_text() {
            return serde_json::from_str(msg.to_text().unwrap()).unwrap();
        }
    }
}

async fn send(client: &mut Client, frame: &str) {
    client.send(Message::text(frame)).await.unwrap();
}

async fn wait_for_connections(relay: &Arc<Relay>, expected: usize) {
    for _ in 0..100 {
        if relay.connection_count() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(relay.connection_count(), expected);
}

#[tokio::test]
async fn test_gateway_round_trip_over_tcp() {
    let app = TestApp::new();
    let addr = serve(&app).await;

    let (mut client, _) = connect_async(format!("ws://{}/gateway?token={}", addr, token_for(1)))
        .await
        .unwrap();
    wait_for_connections(&app.relay, 1).await;

    send(&mut client, r#"{"event":"join_channel","data":"10"}"#).await;
    send(
        &mut client,
        r#"{"event":"send_message","data":{"content":"over the wire","channelId":"10"}}"#,
    )
    .await;

    let reply = next_frame(&mut client).await;
    assert_eq!(reply["event"], "receive_message");
    assert_eq!(reply["data"]["content"], "over the wire");
    assert_eq!(reply["data"]["author"]["id"], "1");
    assert_eq!(app.messages.stored().len(), 1);

    client.send(Message::binary(vec![1u8, 2, 3])).await.unwrap();
    let reply = next_frame(&mut client).await;
    assert_eq!(reply["event"], "error");
    assert_eq!(reply["data"]["kind"], "invalid_event");

    send(&mut client, "{not json").await;
    let reply = next_frame(&mut client).await;
    assert_eq!(reply["event"], "error");
    assert_eq!(reply["data"]["kind"], "invalid_event");

    // Still open after the bad frames.
    send(
        &mut client,
        r#"{"event":"send_message","data":{"content":"still here","channelId":"10"}}"#,
    )
    .await;
    let reply = next_frame(&mut client).await;
    assert_eq!(reply["event"], "receive_message");
    assert_eq!(reply["data"]["content"], "still here");

    client.close(None).await.unwrap();
    wait_for_connections(&app.relay, 0).await;
    assert_eq!(app.relay.room_count(), 0);
}

#[tokio::test]
async fn test_gateway_refuses_bad_token_over_tcp() {
    let app = TestApp::new();
    let addr = serve(&app).await;

    let result = connect_async(format!("ws://{}/gateway?token=forged", addr)).await;

    assert!(result.is_err());
    assert_eq!(app.relay.connection_count(), 0);
}
