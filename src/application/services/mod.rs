//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **IdentityVerifier**: Bearer credential verification
//! - **UserService**: Profiles, search and stored status
//! - **ServerService**: Server management
//! - **ChannelService**: Channel operations and pinned messages
//! - **MessageService**: Message persistence, history, edits and reactions

pub mod identity_service;
pub mod user_service;
pub mod server_service;
pub mod channel_service;
pub mod message_service;

pub use identity_service::{AuthError, Claims, IdentityVerifier, JwtIdentityVerifier};

pub use user_service::{UpdateProfileDto, UserError, UserService, UserServiceImpl};

pub use server_service::{
    CreateServerDto, ServerError, ServerService, ServerServiceImpl, ServerStats, ServerWithChannels,
    UpdateServerDto,
};

pub use channel_service::{
    ChannelError, ChannelService, ChannelServiceImpl, CreateChannelDto, UpdateChannelDto,
};

pub use message_service::{
    MessageDraft, MessageDto, MessageError, MessageQueryDto, MessageService, MessageServiceImpl,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};

#[cfg(test)]
pub use identity_service::MockIdentityVerifier;
#[cfg(test)]
pub use message_service::MockMessageService;
