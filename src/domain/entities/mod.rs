//! # Domain Entities
//!
//! Entities map directly to their database tables. Each entity has an
//! associated repository trait implemented in the infrastructure layer.

mod user;
mod server;
mod channel;
mod message;
mod reaction;

pub use user::{User, UserStatus, UserRepository, InvalidStatus};
pub use server::{ChannelMessageCount, Server, ServerInvite, ServerRepository};
pub use channel::{Channel, ChannelType, ChannelRepository};
pub use message::{Message, MessageAuthor, AuthoredMessage, MessageRepository};
pub use reaction::{ReactionGroup, ReactionRepository};

#[cfg(test)]
pub use channel::MockChannelRepository;
#[cfg(test)]
pub use message::MockMessageRepository;
#[cfg(test)]
pub use reaction::MockReactionRepository;
#[cfg(test)]
pub use server::MockServerRepository;
#[cfg(test)]
pub use user::MockUserRepository;
