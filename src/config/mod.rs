//! # Configuration Module
//!
//! Application configuration loading and management.
//! Configuration can be loaded from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{environment}.toml)
//! - .env files (via dotenvy)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chat_relay::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("Relay persistence deadline: {:?}", settings.relay.persistence_timeout());
//! ```

mod settings;

pub use settings::*;
