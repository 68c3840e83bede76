//! HTTP Handlers
//!
//! Request handlers for all HTTP endpoints.

pub mod health;
pub mod user;
pub mod server;
pub mod channel;
pub mod message;
pub mod invite;
