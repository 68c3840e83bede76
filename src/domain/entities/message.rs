//! Message entity and repository trait.
//!
//! Maps to the `messages` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A chat message.
///
/// Maps to the `messages` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - channel_id: BIGINT NOT NULL REFERENCES channels(id) ON DELETE CASCADE
/// - author_id: BIGINT NOT NULL REFERENCES users(id)
/// - content: TEXT NOT NULL (may be empty for attachment-only messages)
/// - attachments: TEXT[] NOT NULL DEFAULT '{}'
/// - edited_at: TIMESTAMPTZ NULL
/// - created_at: TIMESTAMPTZ NOT NULL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub channel_id: i64,
    pub author_id: i64,
    pub content: String,
    pub attachments: Vec<String>,
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }

    pub fn is_authored_by(&self, user_id: i64) -> bool {
        self.author_id == user_id
    }
}

/// Author display information joined onto a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageAuthor {
    pub id: i64,
    pub username: String,
    pub avatar_url: Option<String>,
}

/// A message together with its author's display information.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthoredMessage {
    pub message: Message,
    pub author: MessageAuthor,
}

/// Repository trait for Message data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, AppError>;

    /// Find a message joined with its author.
    async fn find_authored(&self, id: i64) -> Result<Option<AuthoredMessage>, AppError>;

    /// Keyset pagination over a channel's history.
    /// - `before`: messages older than this id, newest first
    /// - `after`: messages newer than this id, oldest first
    async fn find_by_channel(
        &self,
        channel_id: i64,
        before: Option<i64>,
        after: Option<i64>,
        limit: i64,
    ) -> Result<Vec<AuthoredMessage>, AppError>;

    async fn create(&self, message: &Message) -> Result<Message, AppError>;

    async fn update_content(
        &self,
        id: i64,
        content: &str,
        edited_at: DateTime<Utc>,
    ) -> Result<Message, AppError>;

    async fn delete(&self, id: i64) -> Result<(), AppError>;
}
