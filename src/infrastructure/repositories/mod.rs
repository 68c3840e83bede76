//! Repository Implementations
//!
//! PostgreSQL implementations of the domain repository traits.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use sqlx::PgPool;
//! use chat_relay::infrastructure::repositories::{PgChannelRepository, PgMessageRepository};
//!
//! fn setup(pool: PgPool) {
//!     let channels = PgChannelRepository::new(pool.clone());
//!     let messages = PgMessageRepository::new(pool);
//! }
//! ```

pub mod user_repository;
pub mod server_repository;
pub mod channel_repository;
pub mod message_repository;
pub mod reaction_repository;

pub use user_repository::PgUserRepository;
pub use server_repository::PgServerRepository;
pub use channel_repository::PgChannelRepository;
pub use message_repository::PgMessageRepository;
pub use reaction_repository::PgReactionRepository;
