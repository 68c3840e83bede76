//! Realtime Relay
//!
//! WebSocket endpoint, wire events, and the in-process relay that tracks
//! connections and room membership.

pub mod connection;
pub mod events;
pub mod handler;
pub mod registry;
pub mod relay;

pub use connection::{ConnectionHandle, ConnectionState};
pub use events::{ClientEvent, ServerEvent};
pub use handler::ws_handler;
pub use relay::{Relay, RelayError};
