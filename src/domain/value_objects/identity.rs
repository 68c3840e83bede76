//! Verified caller identity.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{MessageAuthor, User};

/// A user identity resolved from a bearer credential.
///
/// The relay attaches one of these to every connection at handshake time and
/// uses it as the author of everything the connection sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
    pub avatar_url: Option<String>,
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
            avatar_url: user.avatar_url,
        }
    }
}

impl From<&Identity> for MessageAuthor {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.user_id,
            username: identity.username.clone(),
            avatar_url: identity.avatar_url.clone(),
        }
    }
}
