//! WebSocket Connection Handler
//!
//! Verifies the credential on the upgrade request, then pumps frames between
//! the socket and the relay until either side goes away.

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::{IntoResponse, Response},
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use super::connection::ConnectionHandle;
use super::events::ClientEvent;
use super::relay::{Relay, RelayError};
use crate::domain::{ConnectionId, Identity};
use crate::infrastructure::metrics;
use crate::startup::AppState;

/// Query string of the upgrade request
#[derive(Debug, Default, Deserialize)]
pub struct GatewayQuery {
    pub token: Option<String>,
}

/// WebSocket upgrade handler.
///
/// The credential comes from `?token=` or an `Authorization: Bearer` header and
/// is verified before the upgrade is accepted, so a rejected client never gets
/// a connection.
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<GatewayQuery>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let token = query
        .token
        .filter(|t| !t.trim().is_empty())
        .or_else(|| bearer.map(|TypedHeader(Authorization(b))| b.token().to_string()));

    let identity = match authenticate(&state, token.as_deref()).await {
        Ok(identity) => identity,
        Err(err) => {
            metrics::record_handshake_rejected(err.kind());
            return err.into_response();
        }
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    ws.max_message_size(state.settings.websocket.max_message_size)
        .max_frame_size(state.settings.websocket.max_frame_size)
        .on_upgrade(move |socket| handle_socket(socket, state, identity))
}

async fn authenticate(state: &AppState, token: Option<&str>) -> Result<Identity, RelayError> {
    let token = token.ok_or(RelayError::MissingCredential)?;

    state.identity.verify(token).await.map_err(|e| {
        tracing::debug!(error = %e, "Gateway credential rejected");
        RelayError::InvalidCredential
    })
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState, identity: Identity) {
    let relay = state.relay.clone();
    let ConnectionHandle { id, mut events } = relay.connect(identity);

    // Split socket for concurrent read/write
    let (mut sender, mut receiver) = socket.split();

    // Forward queued events to the socket
    let mut writer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let frame = match event.to_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!(event = event.name(), error = %e, "Failed to encode event");
                    continue;
                }
            };
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_frame(&relay, id, text.as_str()).await;
                    }
                    Some(Ok(Message::Binary(_))) => {
                        relay.report_error(
                            id,
                            &RelayError::InvalidEvent("binary frames are not supported".into()),
                        );
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(connection_id = %id, "Connection closed by client");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Ping/pong is answered by axum
                    }
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %id, error = %e, "WebSocket error");
                        break;
                    }
                }
            }

            _ = &mut writer => {
                tracing::debug!(connection_id = %id, "Writer finished");
                break;
            }
        }
    }

    // Cleanup
    relay.disconnect(id);
    writer.abort();
}

/// Decode one text frame and dispatch it, reporting any error to the sender.
async fn handle_frame(relay: &Relay, id: ConnectionId, text: &str) {
    let result = match ClientEvent::parse(text) {
        Ok(event) => relay.dispatch(id, event).await,
        Err(err) => Err(err),
    };

    if let Err(err) = result {
        relay.report_error(id, &err);
    }
}
