//! Server Service
//!
//! Handles server creation and management, membership and invites. The
//! creator of a server is its owner and first member; only the owner may
//! modify or delete it. Any member may create invites.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::{
    Channel, ChannelMessageCount, ChannelRepository, Server, ServerInvite, ServerRepository,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

const SEARCH_LIMIT: i64 = 25;

/// Server service trait
#[async_trait]
pub trait ServerService: Send + Sync {
    async fn create_server(&self, owner_id: i64, request: CreateServerDto) -> Result<Server, ServerError>;

    /// Get a server together with its channels
    async fn get_server(&self, server_id: i64) -> Result<ServerWithChannels, ServerError>;

    async fn update_server(
        &self,
        server_id: i64,
        actor_id: i64,
        update: UpdateServerDto,
    ) -> Result<Server, ServerError>;

    async fn delete_server(&self, server_id: i64, actor_id: i64) -> Result<(), ServerError>;

    async fn search_servers(&self, query: &str) -> Result<Vec<Server>, ServerError>;

    /// Servers a user is a member of
    async fn get_user_servers(&self, user_id: i64) -> Result<Vec<Server>, ServerError>;

    async fn create_invite(&self, server_id: i64, actor_id: i64) -> Result<ServerInvite, ServerError>;

    /// Join the server an invite code points at
    async fn join_by_invite(&self, code: &str, user_id: i64) -> Result<Server, ServerError>;

    /// Member ids and per-channel message counts; members only
    async fn get_server_stats(&self, server_id: i64, actor_id: i64) -> Result<ServerStats, ServerError>;
}

/// Create server request
#[derive(Debug, Clone)]
pub struct CreateServerDto {
    pub name: String,
    pub icon_url: Option<String>,
}

/// Update server request
#[derive(Debug, Clone, Default)]
pub struct UpdateServerDto {
    pub name: Option<String>,
    pub icon_url: Option<String>,
}

/// A server with its channel list
#[derive(Debug, Clone)]
pub struct ServerWithChannels {
    pub server: Server,
    pub channels: Vec<Channel>,
}

/// Raw server statistics. Activity depends on live presence and is
/// derived by the caller.
#[derive(Debug, Clone)]
pub struct ServerStats {
    pub member_ids: Vec<i64>,
    pub channel_message_counts: Vec<ChannelMessageCount>,
}

/// Server service errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Server not found")]
    NotFound,

    #[error("Only the server owner can do this")]
    NotOwner,

    #[error("Not a member of this server")]
    NotMember,

    #[error("Already a member of this server")]
    AlreadyMember,

    #[error("Invite not found")]
    InviteNotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AppError> for ServerError {
    fn from(err: AppError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<ServerError> for AppError {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::NotFound => AppError::NotFound("Server not found".into()),
            e @ (ServerError::NotOwner | ServerError::NotMember) => AppError::Forbidden(e.to_string()),
            e @ ServerError::AlreadyMember => AppError::BadRequest(e.to_string()),
            e @ ServerError::InviteNotFound => AppError::NotFound(e.to_string()),
            ServerError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// ServerService implementation
pub struct ServerServiceImpl<S, C>
where
    S: ServerRepository,
    C: ChannelRepository,
{
    server_repo: Arc<S>,
    channel_repo: Arc<C>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<S, C> ServerServiceImpl<S, C>
where
    S: ServerRepository,
    C: ChannelRepository,
{
    pub fn new(server_repo: Arc<S>, channel_repo: Arc<C>, id_generator: Arc<SnowflakeGenerator>) -> Self {
        Self {
            server_repo,
            channel_repo,
            id_generator,
        }
    }

    async fn owned_server(&self, server_id: i64, actor_id: i64) -> Result<Server, ServerError> {
        let server = self
            .server_repo
            .find_by_id(server_id)
            .await?
            .ok_or(ServerError::NotFound)?;

        if !server.is_owner(actor_id) {
            return Err(ServerError::NotOwner);
        }

        Ok(server)
    }

    async fn member_server(&self, server_id: i64, actor_id: i64) -> Result<Server, ServerError> {
        let server = self
            .server_repo
            .find_by_id(server_id)
            .await?
            .ok_or(ServerError::NotFound)?;

        if !self.server_repo.is_member(server_id, actor_id).await? {
            return Err(ServerError::NotMember);
        }

        Ok(server)
    }
}

#[async_trait]
impl<S, C> ServerService for ServerServiceImpl<S, C>
where
    S: ServerRepository + 'static,
    C: ChannelRepository + 'static,
{
    async fn create_server(&self, owner_id: i64, request: CreateServerDto) -> Result<Server, ServerError> {
        let now = Utc::now();
        let server = Server {
            id: self.id_generator.generate(),
            name: request.name,
            icon_url: request.icon_url,
            owner_id,
            created_at: now,
            updated_at: now,
        };

        let created = self.server_repo.create(&server).await?;
        tracing::info!(server_id = created.id, owner_id, "Server created");

        Ok(created)
    }

    async fn get_server(&self, server_id: i64) -> Result<ServerWithChannels, ServerError> {
        let server = self
            .server_repo
            .find_by_id(server_id)
            .await?
            .ok_or(ServerError::NotFound)?;
        let channels = self.channel_repo.find_by_server(server_id).await?;

        Ok(ServerWithChannels { server, channels })
    }

    async fn update_server(
        &self,
        server_id: i64,
        actor_id: i64,
        update: UpdateServerDto,
    ) -> Result<Server, ServerError> {
        let mut server = self.owned_server(server_id, actor_id).await?;

        if let Some(name) = update.name {
            server.name = name;
        }
        if let Some(icon_url) = update.icon_url {
            server.icon_url = Some(icon_url);
        }

        Ok(self.server_repo.update(&server).await?)
    }

    async fn delete_server(&self, server_id: i64, actor_id: i64) -> Result<(), ServerError> {
        self.owned_server(server_id, actor_id).await?;
        self.server_repo.delete(server_id).await?;

        tracing::info!(server_id, "Server deleted");
        Ok(())
    }

    async fn search_servers(&self, query: &str) -> Result<Vec<Server>, ServerError> {
        Ok(self.server_repo.search(query, SEARCH_LIMIT).await?)
    }

    async fn get_user_servers(&self, user_id: i64) -> Result<Vec<Server>, ServerError> {
        Ok(self.server_repo.find_by_member(user_id).await?)
    }

    async fn create_invite(&self, server_id: i64, actor_id: i64) -> Result<ServerInvite, ServerError> {
        self.member_server(server_id, actor_id).await?;

        let invite = ServerInvite {
            code: Uuid::new_v4().to_string(),
            server_id,
            inviter_id: actor_id,
            created_at: Utc::now(),
        };
        let created = self.server_repo.create_invite(&invite).await?;
        tracing::debug!(server_id, inviter_id = actor_id, "Invite created");

        Ok(created)
    }

    async fn join_by_invite(&self, code: &str, user_id: i64) -> Result<Server, ServerError> {
        let invite = self
            .server_repo
            .find_invite(code)
            .await?
            .ok_or(ServerError::InviteNotFound)?;
        let server = self
            .server_repo
            .find_by_id(invite.server_id)
            .await?
            .ok_or(ServerError::NotFound)?;

        if !self.server_repo.add_member(server.id, user_id).await? {
            return Err(ServerError::AlreadyMember);
        }

        tracing::info!(server_id = server.id, user_id, "Joined server by invite");
        Ok(server)
    }

    async fn get_server_stats(&self, server_id: i64, actor_id: i64) -> Result<ServerStats, ServerError> {
        self.member_server(server_id, actor_id).await?;

        Ok(ServerStats {
            member_ids: self.server_repo.member_ids(server_id).await?,
            channel_message_counts: self.server_repo.channel_message_counts(server_id).await?,
        })
    }
}
