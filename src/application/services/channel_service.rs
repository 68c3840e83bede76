//! Channel Service
//!
//! Handles channel management, search and pinned messages.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{Channel, ChannelRepository, ChannelType, MessageRepository, ServerRepository};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Maximum number of search results returned
const SEARCH_LIMIT: i64 = 25;

/// Channel service trait
#[async_trait]
pub trait ChannelService: Send + Sync {
    /// Create a new channel in a server (owner only)
    async fn create_channel(
        &self,
        server_id: i64,
        actor_id: i64,
        request: CreateChannelDto,
    ) -> Result<Channel, ChannelError>;

    async fn get_channel(&self, channel_id: i64) -> Result<Channel, ChannelError>;

    /// Update channel (server owner only)
    async fn update_channel(
        &self,
        channel_id: i64,
        actor_id: i64,
        update: UpdateChannelDto,
    ) -> Result<Channel, ChannelError>;

    /// Delete channel (server owner only)
    async fn delete_channel(&self, channel_id: i64, actor_id: i64) -> Result<(), ChannelError>;

    async fn search_channels(&self, query: &str) -> Result<Vec<Channel>, ChannelError>;

    /// Pin a message; the message must belong to the channel
    async fn pin_message(&self, channel_id: i64, message_id: i64) -> Result<Channel, ChannelError>;

    async fn unpin_message(&self, channel_id: i64) -> Result<Channel, ChannelError>;
}

/// Create channel request
#[derive(Debug, Clone)]
pub struct CreateChannelDto {
    pub name: String,
    pub channel_type: Option<String>,
    pub description: Option<String>,
}

/// Update channel request
#[derive(Debug, Clone, Default)]
pub struct UpdateChannelDto {
    pub name: Option<String>,
    pub channel_type: Option<String>,
    pub description: Option<String>,
}

/// Channel service errors
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel not found")]
    NotFound,

    #[error("Server not found")]
    ServerNotFound,

    #[error("Message not found in this channel")]
    MessageNotFound,

    #[error("Permission denied")]
    Forbidden,

    #[error("Invalid channel type")]
    InvalidChannelType,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AppError> for ChannelError {
    fn from(err: AppError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<ChannelError> for AppError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::NotFound => AppError::NotFound("Channel not found".into()),
            ChannelError::ServerNotFound => AppError::NotFound("Server not found".into()),
            ChannelError::MessageNotFound => {
                AppError::NotFound("Message not found in this channel".into())
            }
            ChannelError::Forbidden => AppError::Forbidden("Permission denied".into()),
            ChannelError::InvalidChannelType => AppError::BadRequest(
                "Channel type must be one of: text, voice, video".into(),
            ),
            ChannelError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// ChannelService implementation
pub struct ChannelServiceImpl<C, S, M>
where
    C: ChannelRepository,
    S: ServerRepository,
    M: MessageRepository,
{
    channel_repo: Arc<C>,
    server_repo: Arc<S>,
    message_repo: Arc<M>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<C, S, M> ChannelServiceImpl<C, S, M>
where
    C: ChannelRepository,
    S: ServerRepository,
    M: MessageRepository,
{
    pub fn new(
        channel_repo: Arc<C>,
        server_repo: Arc<S>,
        message_repo: Arc<M>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            channel_repo,
            server_repo,
            message_repo,
            id_generator,
        }
    }

    async fn require_owner(&self, server_id: i64, user_id: i64) -> Result<(), ChannelError> {
        let server = self
            .server_repo
            .find_by_id(server_id)
            .await?
            .ok_or(ChannelError::ServerNotFound)?;

        if server.is_owner(user_id) {
            Ok(())
        } else {
            Err(ChannelError::Forbidden)
        }
    }

    async fn find_channel(&self, channel_id: i64) -> Result<Channel, ChannelError> {
        self.channel_repo
            .find_by_id(channel_id)
            .await?
            .ok_or(ChannelError::NotFound)
    }

    fn parse_channel_type(type_str: Option<&str>) -> Result<ChannelType, ChannelError> {
        match type_str {
            None => Ok(ChannelType::Text),
            Some("text") => Ok(ChannelType::Text),
            Some("voice") => Ok(ChannelType::Voice),
            Some("video") => Ok(ChannelType::Video),
            Some(_) => Err(ChannelError::InvalidChannelType),
        }
    }
}

#[async_trait]
impl<C, S, M> ChannelService for ChannelServiceImpl<C, S, M>
where
    C: ChannelRepository + 'static,
    S: ServerRepository + 'static,
    M: MessageRepository + 'static,
{
    async fn create_channel(
        &self,
        server_id: i64,
        actor_id: i64,
        request: CreateChannelDto,
    ) -> Result<Channel, ChannelError> {
        let channel_type = Self::parse_channel_type(request.channel_type.as_deref())?;
        self.require_owner(server_id, actor_id).await?;

        let now = Utc::now();
        let channel = Channel {
            id: self.id_generator.generate(),
            server_id,
            name: request.name,
            channel_type,
            description: request.description.unwrap_or_default(),
            pinned_message_id: None,
            created_at: now,
            updated_at: now,
        };

        Ok(self.channel_repo.create(&channel).await?)
    }

    async fn get_channel(&self, channel_id: i64) -> Result<Channel, ChannelError> {
        self.find_channel(channel_id).await
    }

    async fn update_channel(
        &self,
        channel_id: i64,
        actor_id: i64,
        update: UpdateChannelDto,
    ) -> Result<Channel, ChannelError> {
        let mut channel = self.find_channel(channel_id).await?;
        self.require_owner(channel.server_id, actor_id).await?;

        if let Some(name) = update.name {
            channel.name = name;
        }
        if update.channel_type.is_some() {
            channel.channel_type = Self::parse_channel_type(update.channel_type.as_deref())?;
        }
        if let Some(description) = update.description {
            channel.description = description;
        }

        Ok(self.channel_repo.update(&channel).await?)
    }

    async fn delete_channel(&self, channel_id: i64, actor_id: i64) -> Result<(), ChannelError> {
        let channel = self.find_channel(channel_id).await?;
        self.require_owner(channel.server_id, actor_id).await?;

        self.channel_repo.delete(channel_id).await?;

        Ok(())
    }

    async fn search_channels(&self, query: &str) -> Result<Vec<Channel>, ChannelError> {
        Ok(self.channel_repo.search(query, SEARCH_LIMIT).await?)
    }

    async fn pin_message(&self, channel_id: i64, message_id: i64) -> Result<Channel, ChannelError> {
        let mut channel = self.find_channel(channel_id).await?;

        let message = self
            .message_repo
            .find_by_id(message_id)
            .await?
            .filter(|m| m.channel_id == channel_id)
            .ok_or(ChannelError::MessageNotFound)?;

        self.channel_repo
            .set_pinned_message(channel_id, Some(message.id))
            .await?;
        channel.pinned_message_id = Some(message.id);

        Ok(channel)
    }

    async fn unpin_message(&self, channel_id: i64) -> Result<Channel, ChannelError> {
        let mut channel = self.find_channel(channel_id).await?;

        self.channel_repo.set_pinned_message(channel_id, None).await?;
        channel.pinned_message_id = None;

        Ok(channel)
    }
}
