//! Realtime relay.
//!
//! Binds verified identities to connections, tracks room membership and fans
//! events out to the right connections. Message sends are persisted through
//! the [`MessageService`] before they are broadcast.
//!
//! Events from one connection are handled in arrival order because the
//! transport awaits each [`Relay::dispatch`] before reading the next frame.
//! Different connections dispatch concurrently; the only await in the relay is
//! the bounded persistence call, so a slow save never stalls other rooms.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use serde_json::json;

use super::connection::{ConnectionHandle, ConnectionState};
use super::events::{
    ClientEvent, DeletedNotice, NotificationPayload, RelayMessage, SendMessagePayload,
    ServerEvent, StatusNotice, TypingNotice,
};
use super::registry::Registry;
use crate::application::services::{MessageDraft, MessageDto, MessageService};
use crate::config::RelaySettings;
use crate::domain::{ConnectionId, Identity, Message, RoomId, UserStatus};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;
use crate::shared::snowflake;

/// Sent to the author when a message could not be stored
const SEND_FAILED: &str = "Message could not be sent";

/// Relay error taxonomy. Every error is scoped to the connection that caused it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("Missing credential")]
    MissingCredential,

    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Message could not be sent")]
    PersistenceFailed,

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("{0}")]
    MessageRejected(String),

    #[error("Connection is closed")]
    Disconnected,
}

impl RelayError {
    /// Stable wire name of the error
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::InvalidCredential => "invalid_credential",
            Self::InvalidStatus(_) => "invalid_status",
            Self::PersistenceFailed => "persistence_failed",
            Self::InvalidEvent(_) => "invalid_event",
            Self::MessageRejected(_) => "message_rejected",
            Self::Disconnected => "disconnected",
        }
    }

    /// Errors already reported to the sender through `message_error`.
    fn reported_as_message_error(&self) -> bool {
        matches!(self, Self::PersistenceFailed | Self::MessageRejected(_))
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::MissingCredential | Self::InvalidCredential => StatusCode::UNAUTHORIZED,
            Self::Disconnected => StatusCode::GONE,
            _ => StatusCode::BAD_REQUEST,
        };
        let body = json!({ "kind": self.kind(), "message": self.to_string() });
        (status, Json(body)).into_response()
    }
}

impl From<RelayError> for AppError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::MissingCredential | RelayError::InvalidCredential => {
                AppError::Unauthorized(err.to_string())
            }
            RelayError::PersistenceFailed => AppError::Internal(err.to_string()),
            e => AppError::BadRequest(e.to_string()),
        }
    }
}

/// The in-process relay shared by every connection.
pub struct Relay {
    registry: Registry,
    /// Last status each user chose explicitly
    presence: DashMap<i64, UserStatus>,
    messages: Arc<dyn MessageService>,
    settings: RelaySettings,
}

impl Relay {
    pub fn new(messages: Arc<dyn MessageService>, settings: RelaySettings) -> Self {
        Self {
            registry: Registry::new(),
            presence: DashMap::new(),
            messages,
            settings,
        }
    }

    fn update_gauges(&self) {
        metrics::set_relay_gauges(self.registry.connection_count(), self.registry.room_count());
    }

    /// Bind a verified identity to a new connection.
    pub fn connect(&self, identity: Identity) -> ConnectionHandle {
        let user_id = identity.user_id;
        let handle = self.registry.register(identity);
        self.update_gauges();

        tracing::info!(connection_id = %handle.id, user_id, "Relay connection opened");
        handle
    }

    /// Drop a connection and its room memberships. Returns false if it was
    /// already gone.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let Some(departed) = self.registry.unregister(id) else {
            return false;
        };
        self.update_gauges();

        tracing::info!(
            connection_id = %id,
            user_id = departed.identity.user_id,
            rooms = departed.rooms.len(),
            "Relay connection closed"
        );
        true
    }

    pub fn state_of(&self, id: ConnectionId) -> ConnectionState {
        self.registry.state_of(id)
    }

    /// Handle one inbound event for a connection.
    pub async fn dispatch(&self, id: ConnectionId, event: ClientEvent) -> Result<(), RelayError> {
        if !self.registry.state_of(id).accepts_events() {
            return Err(RelayError::Disconnected);
        }
        metrics::record_relay_event(event.name());

        match event {
            ClientEvent::JoinChannel(room) => self.join(id, &room),
            ClientEvent::LeaveChannel(room) => self.leave(id, &room),
            ClientEvent::SendMessage(payload) => self.send_message(id, payload).await,
            ClientEvent::Typing(payload) => self.typing(id, &payload.channel_id),
            ClientEvent::StopTyping(payload) => self.stop_typing(id, &payload.channel_id),
            ClientEvent::UpdateStatus(status) => self.update_status(id, &status),
            ClientEvent::SendNotification(payload) => self.send_notification(id, payload),
        }
    }

    fn identity_of(&self, id: ConnectionId) -> Result<Identity, RelayError> {
        self.registry.activate(id).ok_or(RelayError::Disconnected)
    }

    pub fn join(&self, id: ConnectionId, room: &RoomId) -> Result<(), RelayError> {
        self.identity_of(id)?;
        let added = self.registry.join(id, room).ok_or(RelayError::Disconnected)?;
        if added {
            self.update_gauges();
            tracing::debug!(connection_id = %id, room = %room, "Joined room");
        }
        Ok(())
    }

    pub fn leave(&self, id: ConnectionId, room: &RoomId) -> Result<(), RelayError> {
        self.identity_of(id)?;
        let removed = self.registry.leave(id, room).ok_or(RelayError::Disconnected)?;
        if removed {
            self.update_gauges();
            tracing::debug!(connection_id = %id, room = %room, "Left room");
        }
        Ok(())
    }

    /// Persist a message, then broadcast it to the whole room including the
    /// sender. On failure only the sender hears about it.
    pub async fn send_message(
        &self,
        id: ConnectionId,
        payload: SendMessagePayload,
    ) -> Result<(), RelayError> {
        let author = self.identity_of(id)?;
        let room = payload.channel_id.clone();
        let draft = MessageDraft {
            channel_id: payload.channel_id,
            author,
            content: payload.content,
            attachments: payload.attachments,
        };

        let started = Instant::now();
        let saved = tokio::time::timeout(
            self.settings.persistence_timeout(),
            self.messages.create_message(draft),
        )
        .await;
        let elapsed = started.elapsed().as_secs_f64();

        let message = match saved {
            Ok(Ok(message)) => {
                metrics::record_message_persist("success", elapsed);
                message
            }
            Ok(Err(e)) if e.is_rejection() => {
                metrics::record_message_persist("rejected", elapsed);
                let err = RelayError::MessageRejected(e.to_string());
                self.registry.send_to(
                    id,
                    ServerEvent::MessageError {
                        message: err.to_string(),
                    },
                );
                return Err(err);
            }
            Ok(Err(e)) => {
                metrics::record_message_persist("failure", elapsed);
                tracing::warn!(connection_id = %id, room = %room, error = %e, "Message persistence failed");
                self.registry.send_to(id, ServerEvent::MessageError { message: SEND_FAILED.into() });
                return Err(RelayError::PersistenceFailed);
            }
            Err(_) => {
                metrics::record_message_persist("timeout", elapsed);
                tracing::warn!(connection_id = %id, room = %room, "Message persistence timed out");
                self.registry.send_to(id, ServerEvent::MessageError { message: SEND_FAILED.into() });
                return Err(RelayError::PersistenceFailed);
            }
        };

        let delivered = self
            .registry
            .broadcast_room(&room, ServerEvent::ReceiveMessage(RelayMessage::from(message)), None);
        tracing::debug!(connection_id = %id, room = %room, delivered, "Message relayed");

        Ok(())
    }

    /// Tell the rest of the room this connection's user is typing.
    pub fn typing(&self, id: ConnectionId, room: &RoomId) -> Result<(), RelayError> {
        let identity = self.identity_of(id)?;
        self.registry.broadcast_room(
            room,
            ServerEvent::UserTyping(TypingNotice::new(&identity, room)),
            Some(id),
        );
        Ok(())
    }

    pub fn stop_typing(&self, id: ConnectionId, room: &RoomId) -> Result<(), RelayError> {
        let identity = self.identity_of(id)?;
        self.registry.broadcast_room(
            room,
            ServerEvent::UserStoppedTyping(TypingNotice::new(&identity, room)),
            Some(id),
        );
        Ok(())
    }

    /// Change the sender's presence and announce it to every connection.
    pub fn update_status(&self, id: ConnectionId, status: &str) -> Result<(), RelayError> {
        let identity = self.identity_of(id)?;
        let status: UserStatus = status
            .parse()
            .map_err(|_| RelayError::InvalidStatus(status.to_string()))?;

        self.set_presence(identity.user_id, status);
        Ok(())
    }

    /// Record a presence change and broadcast it system-wide.
    pub fn set_presence(&self, user_id: i64, status: UserStatus) -> usize {
        self.presence.insert(user_id, status);

        let delivered = self.registry.broadcast_all(ServerEvent::StatusUpdated(StatusNotice {
            user_id: user_id.to_string(),
            status,
        }));
        tracing::debug!(user_id, status = %status, delivered, "Presence updated");
        delivered
    }

    /// Current presence: the last chosen status while the user is connected,
    /// offline otherwise.
    pub fn presence_of(&self, user_id: i64) -> UserStatus {
        if self.registry.user_connection_count(user_id) == 0 {
            return UserStatus::Offline;
        }
        self.presence
            .get(&user_id)
            .map(|status| *status)
            .unwrap_or(UserStatus::Online)
    }

    /// Deliver a payload to every connection of the recipient. Unknown or
    /// offline recipients are dropped silently.
    pub fn send_notification(
        &self,
        id: ConnectionId,
        payload: NotificationPayload,
    ) -> Result<(), RelayError> {
        self.identity_of(id)?;

        let Ok(recipient) = snowflake::from_string(&payload.recipient_id) else {
            tracing::debug!(connection_id = %id, recipient = %payload.recipient_id, "Dropping notification to unparseable recipient");
            return Ok(());
        };

        self.registry.send_to_user(
            recipient,
            ServerEvent::ReceiveNotification {
                message: payload.message,
            },
        );
        Ok(())
    }

    /// Push an edited message to its channel's room.
    pub fn broadcast_message_update(&self, message: MessageDto) -> usize {
        let room = RoomId::from(message.channel_id);
        self.registry
            .broadcast_room(&room, ServerEvent::MessageUpdated(RelayMessage::from(message)), None)
    }

    /// Tell a channel's room that a message is gone.
    pub fn broadcast_message_delete(&self, message: &Message) -> usize {
        let room = RoomId::from(message.channel_id);
        self.registry.broadcast_room(
            &room,
            ServerEvent::MessageDeleted(DeletedNotice {
                id: message.id.to_string(),
                channel_id: message.channel_id.to_string(),
            }),
            None,
        )
    }

    /// Report a failed dispatch back to the connection that caused it.
    pub fn report_error(&self, id: ConnectionId, err: &RelayError) {
        if err.reported_as_message_error() || *err == RelayError::Disconnected {
            return;
        }
        tracing::debug!(connection_id = %id, kind = err.kind(), error = %err, "Rejected relay event");
        self.registry.send_to(id, ServerEvent::error(err));
    }

    pub fn members_of(&self, room: &RoomId) -> Vec<ConnectionId> {
        self.registry.members_of(room)
    }

    pub fn rooms_of(&self, id: ConnectionId) -> Vec<RoomId> {
        self.registry.rooms_of(id)
    }

    pub fn connection_count(&self) -> usize {
        self.registry.connection_count()
    }

    pub fn room_count(&self) -> usize {
        self.registry.room_count()
    }
}
