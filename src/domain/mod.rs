//! # Domain Layer
//!
//! Core types of the chat backend, independent of HTTP, WebSocket or SQL.
//!
//! ## Structure
//!
//! - **entities**: Persisted entities (User, Server, Channel, Message, Reaction)
//!   and the repository traits the infrastructure layer implements
//! - **value_objects**: Identity, room and connection identifiers used by the
//!   realtime relay

pub mod entities;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use value_objects::*;
