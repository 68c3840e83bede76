//! Emoji reactions on messages.
//!
//! Maps to the `message_reactions` table (message_id, user_id, emoji), one row
//! per user per emoji.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// All users who reacted to a message with one emoji.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionGroup {
    pub emoji: String,
    pub user_ids: Vec<i64>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReactionRepository: Send + Sync {
    /// Returns false when the user had already reacted with this emoji.
    async fn add(&self, message_id: i64, user_id: i64, emoji: &str) -> Result<bool, AppError>;

    /// Returns false when there was nothing to remove.
    async fn remove(&self, message_id: i64, user_id: i64, emoji: &str) -> Result<bool, AppError>;

    /// Reaction groups for one message, in first-reaction order.
    async fn list_for_message(&self, message_id: i64) -> Result<Vec<ReactionGroup>, AppError>;

    /// Reaction groups for a page of messages, keyed by message id.
    async fn list_for_messages(
        &self,
        message_ids: Vec<i64>,
    ) -> Result<Vec<(i64, ReactionGroup)>, AppError>;
}
