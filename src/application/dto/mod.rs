//! Data Transfer Objects
//!
//! DTOs for API request/response serialization. REST bodies use snake_case;
//! the relay wire format lives with the relay.

pub mod request;
pub mod response;
