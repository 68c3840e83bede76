//! Response DTOs
//!
//! Data structures for API response bodies. Snowflake ids are rendered as
//! strings so JavaScript clients keep full precision.

use serde::Serialize;

use crate::application::services::{MessageDto, ServerStats, ServerWithChannels};
use crate::domain::{
    Channel, ChannelMessageCount, MessageAuthor, ReactionGroup, Server, ServerInvite, User,
    UserStatus,
};

/// User response
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub avatar_url: Option<String>,
    pub status: UserStatus,
    pub created_at: String,
}

impl UserResponse {
    /// Render a user with the given presence in place of the stored status.
    pub fn with_presence(user: User, status: UserStatus) -> Self {
        Self {
            status,
            ..Self::from(user)
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username,
            avatar_url: user.avatar_url,
            status: user.status,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Status change response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub user_id: String,
    pub status: UserStatus,
}

/// Server response
#[derive(Debug, Serialize)]
pub struct ServerResponse {
    pub id: String,
    pub name: String,
    pub icon_url: Option<String>,
    pub owner_id: String,
    pub created_at: String,
}

impl From<Server> for ServerResponse {
    fn from(server: Server) -> Self {
        Self {
            id: server.id.to_string(),
            name: server.name,
            icon_url: server.icon_url,
            owner_id: server.owner_id.to_string(),
            created_at: server.created_at.to_rfc3339(),
        }
    }
}

/// Server with its channels
#[derive(Debug, Serialize)]
pub struct ServerDetailResponse {
    #[serde(flatten)]
    pub server: ServerResponse,
    pub channels: Vec<ChannelResponse>,
}

impl From<ServerWithChannels> for ServerDetailResponse {
    fn from(detail: ServerWithChannels) -> Self {
        Self {
            server: ServerResponse::from(detail.server),
            channels: detail.channels.into_iter().map(ChannelResponse::from).collect(),
        }
    }
}

/// Invite response
#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub invite_code: String,
    pub server_id: String,
}

impl From<ServerInvite> for InviteResponse {
    fn from(invite: ServerInvite) -> Self {
        Self {
            invite_code: invite.code,
            server_id: invite.server_id.to_string(),
        }
    }
}

/// Server statistics
#[derive(Debug, Serialize)]
pub struct ServerStatsResponse {
    pub total_members: usize,
    /// Members currently online
    pub active_members: usize,
    pub channel_message_counts: Vec<ChannelMessageCountResponse>,
}

#[derive(Debug, Serialize)]
pub struct ChannelMessageCountResponse {
    pub channel_id: String,
    pub message_count: i64,
}

impl ServerStatsResponse {
    pub fn new(stats: ServerStats, active_members: usize) -> Self {
        Self {
            total_members: stats.member_ids.len(),
            active_members,
            channel_message_counts: stats
                .channel_message_counts
                .into_iter()
                .map(ChannelMessageCountResponse::from)
                .collect(),
        }
    }
}

impl From<ChannelMessageCount> for ChannelMessageCountResponse {
    fn from(count: ChannelMessageCount) -> Self {
        Self {
            channel_id: count.channel_id.to_string(),
            message_count: count.message_count,
        }
    }
}

/// Channel response
#[derive(Debug, Serialize)]
pub struct ChannelResponse {
    pub id: String,
    pub server_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub channel_type: String,
    pub description: String,
    pub pinned_message_id: Option<String>,
    pub created_at: String,
}

impl From<Channel> for ChannelResponse {
    fn from(channel: Channel) -> Self {
        Self {
            id: channel.id.to_string(),
            server_id: channel.server_id.to_string(),
            name: channel.name,
            channel_type: channel.channel_type.as_str().to_string(),
            description: channel.description,
            pinned_message_id: channel.pinned_message_id.map(|id| id.to_string()),
            created_at: channel.created_at.to_rfc3339(),
        }
    }
}

/// Pinned message state of a channel
#[derive(Debug, Serialize)]
pub struct PinnedMessageResponse {
    pub pinned_message: Option<String>,
}

impl From<Channel> for PinnedMessageResponse {
    fn from(channel: Channel) -> Self {
        Self {
            pinned_message: channel.pinned_message_id.map(|id| id.to_string()),
        }
    }
}

/// Message author summary
#[derive(Debug, Serialize)]
pub struct AuthorResponse {
    pub id: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

impl From<MessageAuthor> for AuthorResponse {
    fn from(author: MessageAuthor) -> Self {
        Self {
            id: author.id.to_string(),
            username: author.username,
            avatar_url: author.avatar_url,
        }
    }
}

/// One emoji and the users who reacted with it
#[derive(Debug, Serialize)]
pub struct ReactionResponse {
    pub emoji: String,
    pub users: Vec<String>,
}

impl From<ReactionGroup> for ReactionResponse {
    fn from(group: ReactionGroup) -> Self {
        Self {
            emoji: group.emoji,
            users: group.user_ids.into_iter().map(|id| id.to_string()).collect(),
        }
    }
}

/// Message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub channel_id: String,
    pub author: AuthorResponse,
    pub content: String,
    pub attachments: Vec<String>,
    pub reactions: Vec<ReactionResponse>,
    pub edited: bool,
    pub edited_at: Option<String>,
    pub created_at: String,
}

impl From<MessageDto> for MessageResponse {
    fn from(message: MessageDto) -> Self {
        Self {
            id: message.id.to_string(),
            channel_id: message.channel_id.to_string(),
            edited: message.is_edited(),
            author: AuthorResponse::from(message.author),
            content: message.content,
            attachments: message.attachments,
            reactions: message.reactions.into_iter().map(ReactionResponse::from).collect(),
            edited_at: message.edited_at.map(|t| t.to_rfc3339()),
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_presence_overrides_stored_status() {
        let user = User {
            id: 3,
            username: "carol".into(),
            avatar_url: None,
            status: UserStatus::Dnd,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let response = UserResponse::with_presence(user, UserStatus::Offline);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "offline");
        assert_eq!(json["id"], "3");
    }

    #[test]
    fn test_reaction_users_rendered_as_strings() {
        let json = serde_json::to_value(ReactionResponse::from(ReactionGroup {
            emoji: "🎉".into(),
            user_ids: vec![1, 2],
        }))
        .unwrap();

        assert_eq!(json, serde_json::json!({"emoji": "🎉", "users": ["1", "2"]}));
    }

    #[test]
    fn test_stats_counts_members() {
        let stats = ServerStats {
            member_ids: vec![1, 2, 3],
            channel_message_counts: vec![ChannelMessageCount {
                channel_id: 10,
                message_count: 4,
            }],
        };

        let json = serde_json::to_value(ServerStatsResponse::new(stats, 1)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "total_members": 3,
                "active_members": 1,
                "channel_message_counts": [{"channel_id": "10", "message_count": 4}]
            })
        );
    }
}
