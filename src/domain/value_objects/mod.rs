//! # Domain Value Objects
//!
//! - **Identity**: a verified user, bound to a relay connection
//! - **RoomId**: a relay room, named by its channel id
//! - **ConnectionId**: opaque per-session identifier

mod identity;
mod room;

pub use identity::*;
pub use room::*;
