//! User entity and repository trait.
//!
//! Maps to the `users` table. Accounts are created by the external identity
//! service; this service reads profiles and keeps presence up to date.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Presence status. The set is closed: anything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Offline,
    Online,
    Idle,
    Dnd,
    Invisible,
}

/// Error returned when a status string is outside the enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid status: {0}")]
pub struct InvalidStatus(pub String);

impl UserStatus {
    pub const ALL: [UserStatus; 5] = [
        Self::Online,
        Self::Idle,
        Self::Dnd,
        Self::Invisible,
        Self::Offline,
    ];

    /// Lenient conversion for values read back from the database.
    pub fn from_db(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Online => "online",
            Self::Idle => "idle",
            Self::Dnd => "dnd",
            Self::Invisible => "invisible",
        }
    }
}

impl FromStr for UserStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidStatus(s.to_string()))
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user profile.
///
/// Maps to the `users` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID, also the JWT subject)
/// - username: VARCHAR(32) NOT NULL UNIQUE
/// - avatar_url: TEXT NULL
/// - status: VARCHAR(20) NOT NULL DEFAULT 'offline'
/// - created_at / updated_at: TIMESTAMPTZ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub avatar_url: Option<String>,
    /// Last status the user chose; live presence is owned by the relay
    #[serde(default)]
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Repository trait for User data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Case-insensitive substring search on username.
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<User>, AppError>;

    async fn update_profile(
        &self,
        id: i64,
        username: Option<String>,
        avatar_url: Option<String>,
    ) -> Result<User, AppError>;

    async fn update_status(&self, id: i64, status: UserStatus) -> Result<(), AppError>;

    /// Returns false when the friendship already existed.
    async fn add_friend(&self, user_id: i64, friend_id: i64) -> Result<bool, AppError>;

    /// Returns false when there was no friendship to remove.
    async fn remove_friend(&self, user_id: i64, friend_id: i64) -> Result<bool, AppError>;

    /// Friends of a user, by username.
    async fn list_friends(&self, user_id: i64) -> Result<Vec<User>, AppError>;
}
