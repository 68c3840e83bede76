//! Message Service
//!
//! Handles message operations: the save path used by the realtime relay,
//! history pagination, edit, delete and reactions.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    AuthoredMessage, ChannelRepository, Identity, Message, MessageAuthor, MessageRepository,
    ReactionGroup, ReactionRepository, RoomId,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Default page size for message history
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Largest page a client may request
pub const MAX_PAGE_SIZE: i64 = 100;

/// Message service trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageService: Send + Sync {
    /// Store a new message and return it with author display info
    async fn create_message(&self, draft: MessageDraft) -> Result<MessageDto, MessageError>;

    /// Get a page of channel history, newest first unless `after` is set
    async fn get_messages(
        &self,
        channel_id: i64,
        query: MessageQueryDto,
    ) -> Result<Vec<MessageDto>, MessageError>;

    /// Edit a message's content (author only)
    async fn edit_message(
        &self,
        message_id: i64,
        actor_id: i64,
        content: String,
    ) -> Result<MessageDto, MessageError>;

    /// Delete a message (author only), returning what was removed
    async fn delete_message(&self, message_id: i64, actor_id: i64) -> Result<Message, MessageError>;

    async fn add_reaction(
        &self,
        message_id: i64,
        user_id: i64,
        emoji: String,
    ) -> Result<Vec<ReactionGroup>, MessageError>;

    async fn remove_reaction(
        &self,
        message_id: i64,
        user_id: i64,
        emoji: String,
    ) -> Result<Vec<ReactionGroup>, MessageError>;
}

/// A message as submitted, before it has an id or timestamp.
///
/// The author is always the sender's verified identity.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDraft {
    pub channel_id: RoomId,
    pub author: Identity,
    pub content: String,
    pub attachments: Vec<String>,
}

/// Message data transfer object
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDto {
    pub id: i64,
    pub channel_id: i64,
    pub author: MessageAuthor,
    pub content: String,
    pub attachments: Vec<String>,
    pub reactions: Vec<ReactionGroup>,
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl MessageDto {
    pub fn new(message: Message, author: MessageAuthor, reactions: Vec<ReactionGroup>) -> Self {
        Self {
            id: message.id,
            channel_id: message.channel_id,
            author,
            content: message.content,
            attachments: message.attachments,
            reactions,
            edited_at: message.edited_at,
            created_at: message.created_at,
        }
    }

    pub fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }
}

impl From<AuthoredMessage> for MessageDto {
    fn from(authored: AuthoredMessage) -> Self {
        Self::new(authored.message, authored.author, Vec::new())
    }
}

/// Message query parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageQueryDto {
    pub before: Option<i64>,
    pub after: Option<i64>,
    pub limit: Option<i64>,
}

impl MessageQueryDto {
    pub fn page_size(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }
}

/// Message service errors
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Message not found")]
    NotFound,

    #[error("Channel not found")]
    ChannelNotFound,

    #[error("Permission denied")]
    Forbidden,

    #[error("Message content is empty")]
    EmptyContent,

    #[error("Message content too long (max {0} characters)")]
    ContentTooLong(usize),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MessageError {
    /// True when the message itself was unacceptable, as opposed to the store failing.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::EmptyContent | Self::ContentTooLong(_))
    }
}

impl From<AppError> for MessageError {
    fn from(err: AppError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<MessageError> for AppError {
    fn from(err: MessageError) -> Self {
        match err {
            MessageError::NotFound => AppError::NotFound("Message not found".into()),
            MessageError::ChannelNotFound => AppError::NotFound("Channel not found".into()),
            MessageError::Forbidden => AppError::Forbidden(
                "Only the author can modify this message".into(),
            ),
            e @ (MessageError::EmptyContent | MessageError::ContentTooLong(_)) => {
                AppError::BadRequest(e.to_string())
            }
            MessageError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// MessageService implementation
pub struct MessageServiceImpl<M, C, R>
where
    M: MessageRepository,
    C: ChannelRepository,
    R: ReactionRepository,
{
    message_repo: Arc<M>,
    channel_repo: Arc<C>,
    reaction_repo: Arc<R>,
    id_generator: Arc<SnowflakeGenerator>,
    max_content_length: usize,
}

impl<M, C, R> MessageServiceImpl<M, C, R>
where
    M: MessageRepository,
    C: ChannelRepository,
    R: ReactionRepository,
{
    pub fn new(
        message_repo: Arc<M>,
        channel_repo: Arc<C>,
        reaction_repo: Arc<R>,
        id_generator: Arc<SnowflakeGenerator>,
        max_content_length: usize,
    ) -> Self {
        Self {
            message_repo,
            channel_repo,
            reaction_repo,
            id_generator,
            max_content_length,
        }
    }

    /// Content may be empty only when the message carries attachments.
    fn check_content(&self, content: &str, has_attachments: bool) -> Result<(), MessageError> {
        if content.trim().is_empty() && !has_attachments {
            return Err(MessageError::EmptyContent);
        }
        if content.chars().count() > self.max_content_length {
            return Err(MessageError::ContentTooLong(self.max_content_length));
        }
        Ok(())
    }

    async fn find_message(&self, message_id: i64) -> Result<Message, MessageError> {
        self.message_repo
            .find_by_id(message_id)
            .await?
            .ok_or(MessageError::NotFound)
    }
}

#[async_trait]
impl<M, C, R> MessageService for MessageServiceImpl<M, C, R>
where
    M: MessageRepository + 'static,
    C: ChannelRepository + 'static,
    R: ReactionRepository + 'static,
{
    async fn create_message(&self, draft: MessageDraft) -> Result<MessageDto, MessageError> {
        self.check_content(&draft.content, !draft.attachments.is_empty())?;

        let channel_id = draft
            .channel_id
            .channel_id()
            .ok_or(MessageError::ChannelNotFound)?;

        self.channel_repo
            .find_by_id(channel_id)
            .await?
            .ok_or(MessageError::ChannelNotFound)?;

        let message = Message {
            id: self.id_generator.generate(),
            channel_id,
            author_id: draft.author.user_id,
            content: draft.content,
            attachments: draft.attachments,
            edited_at: None,
            created_at: Utc::now(),
        };

        let stored = self.message_repo.create(&message).await?;

        Ok(MessageDto::new(
            stored,
            MessageAuthor::from(&draft.author),
            Vec::new(),
        ))
    }

    async fn get_messages(
        &self,
        channel_id: i64,
        query: MessageQueryDto,
    ) -> Result<Vec<MessageDto>, MessageError> {
        self.channel_repo
            .find_by_id(channel_id)
            .await?
            .ok_or(MessageError::ChannelNotFound)?;

        let messages = self
            .message_repo
            .find_by_channel(channel_id, query.before, query.after, query.page_size())
            .await?;

        let ids = messages.iter().map(|m| m.message.id).collect();
        let mut reactions: HashMap<i64, Vec<ReactionGroup>> = HashMap::new();
        for (message_id, group) in self.reaction_repo.list_for_messages(ids).await? {
            reactions.entry(message_id).or_default().push(group);
        }

        Ok(messages
            .into_iter()
            .map(|authored| {
                let groups = reactions.remove(&authored.message.id).unwrap_or_default();
                MessageDto::new(authored.message, authored.author, groups)
            })
            .collect())
    }

    async fn edit_message(
        &self,
        message_id: i64,
        actor_id: i64,
        content: String,
    ) -> Result<MessageDto, MessageError> {
        let message = self.find_message(message_id).await?;

        if !message.is_authored_by(actor_id) {
            return Err(MessageError::Forbidden);
        }

        self.check_content(&content, !message.attachments.is_empty())?;

        self.message_repo
            .update_content(message_id, &content, Utc::now())
            .await?;

        let authored = self
            .message_repo
            .find_authored(message_id)
            .await?
            .ok_or(MessageError::NotFound)?;
        let reactions = self.reaction_repo.list_for_message(message_id).await?;

        Ok(MessageDto::new(authored.message, authored.author, reactions))
    }

    async fn delete_message(&self, message_id: i64, actor_id: i64) -> Result<Message, MessageError> {
        let message = self.find_message(message_id).await?;

        if !message.is_authored_by(actor_id) {
            return Err(MessageError::Forbidden);
        }

        self.message_repo.delete(message_id).await?;

        Ok(message)
    }

    async fn add_reaction(
        &self,
        message_id: i64,
        user_id: i64,
        emoji: String,
    ) -> Result<Vec<ReactionGroup>, MessageError> {
        self.find_message(message_id).await?;

        self.reaction_repo.add(message_id, user_id, &emoji).await?;

        Ok(self.reaction_repo.list_for_message(message_id).await?)
    }

    async fn remove_reaction(
        &self,
        message_id: i64,
        user_id: i64,
        emoji: String,
    ) -> Result<Vec<ReactionGroup>, MessageError> {
        self.find_message(message_id).await?;

        self.reaction_repo.remove(message_id, user_id, &emoji).await?;

        Ok(self.reaction_repo.list_for_message(message_id).await?)
    }
}
