//! User Service
//!
//! Handles profile reads and updates, user search, friends and stored status.
//! Live presence is owned by the relay; this service only persists the
//! status a user last chose.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{User, UserRepository, UserStatus};
use crate::shared::error::AppError;

const SEARCH_LIMIT: i64 = 25;

/// User service trait
#[async_trait]
pub trait UserService: Send + Sync {
    async fn get_user(&self, user_id: i64) -> Result<User, UserError>;

    async fn update_profile(&self, user_id: i64, update: UpdateProfileDto) -> Result<User, UserError>;

    /// Case-insensitive username search
    async fn search_users(&self, query: &str) -> Result<Vec<User>, UserError>;

    /// Validate and store a status; the closed enumeration is enforced here
    async fn update_status(&self, user_id: i64, status: &str) -> Result<UserStatus, UserError>;

    /// Add a friend; returns the friend's profile
    async fn add_friend(&self, user_id: i64, friend_id: i64) -> Result<User, UserError>;

    /// Remove a friend; removing someone who is not a friend is a no-op
    async fn remove_friend(&self, user_id: i64, friend_id: i64) -> Result<(), UserError>;

    async fn get_friends(&self, user_id: i64) -> Result<Vec<User>, UserError>;
}

/// Profile update request
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileDto {
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

/// User service errors
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Already friends with this user")]
    AlreadyFriends,

    #[error("Cannot add yourself as a friend")]
    SelfFriend,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AppError> for UserError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::NotFound(_) => Self::NotFound,
            AppError::Conflict(_) => Self::UsernameTaken,
            e => Self::Internal(e.to_string()),
        }
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound => AppError::NotFound("User not found".into()),
            e @ UserError::UsernameTaken => AppError::Conflict(e.to_string()),
            e @ (UserError::InvalidStatus(_) | UserError::AlreadyFriends | UserError::SelfFriend) => {
                AppError::BadRequest(e.to_string())
            }
            UserError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// UserService implementation
pub struct UserServiceImpl<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> UserServiceImpl<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }
}

#[async_trait]
impl<U> UserService for UserServiceImpl<U>
where
    U: UserRepository + 'static,
{
    async fn get_user(&self, user_id: i64) -> Result<User, UserError> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound)
    }

    async fn update_profile(&self, user_id: i64, update: UpdateProfileDto) -> Result<User, UserError> {
        if let Some(username) = update.username.as_deref() {
            let taken = self
                .user_repo
                .find_by_username(username)
                .await?
                .is_some_and(|existing| existing.id != user_id);
            if taken {
                return Err(UserError::UsernameTaken);
            }
        }

        Ok(self
            .user_repo
            .update_profile(user_id, update.username, update.avatar_url)
            .await?)
    }

    async fn search_users(&self, query: &str) -> Result<Vec<User>, UserError> {
        Ok(self.user_repo.search(query, SEARCH_LIMIT).await?)
    }

    async fn update_status(&self, user_id: i64, status: &str) -> Result<UserStatus, UserError> {
        let status: UserStatus = status
            .parse()
            .map_err(|_| UserError::InvalidStatus(status.to_string()))?;

        self.user_repo.update_status(user_id, status).await?;

        Ok(status)
    }

    async fn add_friend(&self, user_id: i64, friend_id: i64) -> Result<User, UserError> {
        if user_id == friend_id {
            return Err(UserError::SelfFriend);
        }
        let friend = self.get_user(friend_id).await?;

        if !self.user_repo.add_friend(user_id, friend_id).await? {
            return Err(UserError::AlreadyFriends);
        }
        Ok(friend)
    }

    async fn remove_friend(&self, user_id: i64, friend_id: i64) -> Result<(), UserError> {
        self.get_user(friend_id).await?;
        self.user_repo.remove_friend(user_id, friend_id).await?;
        Ok(())
    }

    async fn get_friends(&self, user_id: i64) -> Result<Vec<User>, UserError> {
        Ok(self.user_repo.list_friends(user_id).await?)
    }
}
