//! Server entity and repository trait.
//!
//! Maps to the `servers`, `server_members` and `server_invites` tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A server (community) that owns channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub id: i64,
    pub name: String,
    pub icon_url: Option<String>,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Server {
    pub fn is_owner(&self, user_id: i64) -> bool {
        self.owner_id == user_id
    }
}

/// A join code for a server. Codes do not expire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInvite {
    pub code: String,
    pub server_id: i64,
    pub inviter_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Number of stored messages in one channel of a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessageCount {
    pub channel_id: i64,
    pub message_count: i64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServerRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Server>, AppError>;

    /// Servers the user is a member of, owned ones included.
    async fn find_by_member(&self, user_id: i64) -> Result<Vec<Server>, AppError>;

    /// Case-insensitive substring search on name.
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<Server>, AppError>;

    /// Creates the server and adds its owner as the first member.
    async fn create(&self, server: &Server) -> Result<Server, AppError>;

    async fn update(&self, server: &Server) -> Result<Server, AppError>;

    /// Deletes the server; channels and their messages cascade.
    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// Returns false when the user was already a member.
    async fn add_member(&self, server_id: i64, user_id: i64) -> Result<bool, AppError>;

    async fn is_member(&self, server_id: i64, user_id: i64) -> Result<bool, AppError>;

    async fn member_ids(&self, server_id: i64) -> Result<Vec<i64>, AppError>;

    async fn create_invite(&self, invite: &ServerInvite) -> Result<ServerInvite, AppError>;

    async fn find_invite(&self, code: &str) -> Result<Option<ServerInvite>, AppError>;

    /// One entry per channel of the server, zero counts included.
    async fn channel_message_counts(&self, server_id: i64) -> Result<Vec<ChannelMessageCount>, AppError>;
}
