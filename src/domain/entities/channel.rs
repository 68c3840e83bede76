//! Channel entity and repository trait.
//!
//! Maps to the `channels` table. A channel's id, in string form, is the room
//! identifier used by the realtime relay.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Channel kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    #[default]
    Text,
    Voice,
    Video,
}

impl ChannelType {
    pub fn from_db(s: &str) -> Self {
        match s {
            "voice" => Self::Voice,
            "video" => Self::Video,
            _ => Self::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Voice => "voice",
            Self::Video => "video",
        }
    }
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A channel inside a server.
///
/// Maps to the `channels` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - server_id: BIGINT NOT NULL REFERENCES servers(id) ON DELETE CASCADE
/// - name: VARCHAR(100) NOT NULL
/// - type: VARCHAR(10) NOT NULL DEFAULT 'text'
/// - description: TEXT NOT NULL DEFAULT ''
/// - pinned_message_id: BIGINT NULL (at most one pinned message per channel)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: i64,
    pub server_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
    pub description: String,
    pub pinned_message_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Channel>, AppError>;

    async fn find_by_server(&self, server_id: i64) -> Result<Vec<Channel>, AppError>;

    /// Case-insensitive substring search on name.
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<Channel>, AppError>;

    async fn create(&self, channel: &Channel) -> Result<Channel, AppError>;

    async fn update(&self, channel: &Channel) -> Result<Channel, AppError>;

    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// Set or clear the pinned message.
    async fn set_pinned_message(
        &self,
        channel_id: i64,
        message_id: Option<i64>,
    ) -> Result<(), AppError>;
}
