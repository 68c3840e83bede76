//! Relay wire events.
//!
//! Every frame is a JSON text frame `{"event": <name>, "data": <payload>}`.
//! Inbound frames are decoded into [`ClientEvent`] at the boundary; anything
//! that does not match a known event is rejected as `invalid_event` before it
//! reaches the relay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::relay::RelayError;
use crate::application::services::MessageDto;
use crate::domain::{Identity, MessageAuthor, ReactionGroup, RoomId, UserStatus};
use crate::shared::snowflake::deserialize_raw_id;

fn room_from_raw<'de, D>(deserializer: D) -> Result<RoomId, D::Error>
where
    D: Deserializer<'de>,
{
    let id = RoomId::new(deserialize_raw_id(deserializer)?);
    // "042" and " 42" name the same channel as 42
    Ok(id.channel_id().map(RoomId::from).unwrap_or(id))
}

/// Client to server events
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    #[serde(deserialize_with = "room_from_raw")]
    JoinChannel(RoomId),
    #[serde(deserialize_with = "room_from_raw")]
    LeaveChannel(RoomId),
    SendMessage(SendMessagePayload),
    Typing(TypingPayload),
    StopTyping(TypingPayload),
    UpdateStatus(String),
    SendNotification(NotificationPayload),
}

/// `send_message` payload. Author, id and timestamp fields sent by the
/// client are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    #[serde(default)]
    pub content: String,
    #[serde(deserialize_with = "room_from_raw")]
    pub channel_id: RoomId,
    #[serde(default)]
    pub attachments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    #[serde(deserialize_with = "room_from_raw")]
    pub channel_id: RoomId,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    #[serde(deserialize_with = "deserialize_raw_id")]
    pub recipient_id: String,
    #[serde(default)]
    pub message: serde_json::Value,
}

impl ClientEvent {
    /// Decode a text frame.
    pub fn parse(frame: &str) -> Result<Self, RelayError> {
        serde_json::from_str(frame).map_err(|e| RelayError::InvalidEvent(e.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinChannel(_) => "join_channel",
            Self::LeaveChannel(_) => "leave_channel",
            Self::SendMessage(_) => "send_message",
            Self::Typing(_) => "typing",
            Self::StopTyping(_) => "stop_typing",
            Self::UpdateStatus(_) => "update_status",
            Self::SendNotification(_) => "send_notification",
        }
    }
}

/// Server to client events
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    ReceiveMessage(RelayMessage),
    MessageError { message: String },
    UserTyping(TypingNotice),
    UserStoppedTyping(TypingNotice),
    StatusUpdated(StatusNotice),
    ReceiveNotification { message: serde_json::Value },
    MessageUpdated(RelayMessage),
    MessageDeleted(DeletedNotice),
    Error { kind: &'static str, message: String },
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReceiveMessage(_) => "receive_message",
            Self::MessageError { .. } => "message_error",
            Self::UserTyping(_) => "user_typing",
            Self::UserStoppedTyping(_) => "user_stopped_typing",
            Self::StatusUpdated(_) => "status_updated",
            Self::ReceiveNotification { .. } => "receive_notification",
            Self::MessageUpdated(_) => "message_updated",
            Self::MessageDeleted(_) => "message_deleted",
            Self::Error { .. } => "error",
        }
    }

    /// Encode as a text frame.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn error(err: &RelayError) -> Self {
        Self::Error {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// A persisted message as pushed to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayMessage {
    pub id: String,
    pub channel_id: String,
    pub author: RelayAuthor,
    pub content: String,
    pub attachments: Vec<String>,
    pub reactions: Vec<RelayReaction>,
    pub edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayAuthor {
    pub id: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelayReaction {
    pub emoji: String,
    pub users: Vec<String>,
}

impl From<MessageAuthor> for RelayAuthor {
    fn from(author: MessageAuthor) -> Self {
        Self {
            id: author.id.to_string(),
            username: author.username,
            avatar_url: author.avatar_url,
        }
    }
}

impl From<ReactionGroup> for RelayReaction {
    fn from(group: ReactionGroup) -> Self {
        Self {
            emoji: group.emoji,
            users: group.user_ids.into_iter().map(|id| id.to_string()).collect(),
        }
    }
}

impl From<MessageDto> for RelayMessage {
    fn from(message: MessageDto) -> Self {
        Self {
            id: message.id.to_string(),
            channel_id: message.channel_id.to_string(),
            edited: message.is_edited(),
            author: RelayAuthor::from(message.author),
            content: message.content,
            attachments: message.attachments,
            reactions: message.reactions.into_iter().map(RelayReaction::from).collect(),
            edited_at: message.edited_at,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingNotice {
    pub user_id: String,
    pub username: String,
    pub channel_id: String,
}

impl TypingNotice {
    pub fn new(identity: &Identity, room: &RoomId) -> Self {
        Self {
            user_id: identity.user_id.to_string(),
            username: identity.username.clone(),
            channel_id: room.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusNotice {
    pub user_id: String,
    pub status: UserStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedNotice {
    pub id: String,
    pub channel_id: String,
}
