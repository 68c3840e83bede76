//! # Chat Relay Library
//!
//! Discord-style chat backend built around a realtime message relay:
//! - WebSocket relay for rooms, messages, typing and presence
//! - RESTful HTTP API for users, servers, channels and message history
//! - PostgreSQL for persistent storage
//!
//! ## Architecture
//!
//! - **Domain Layer**: Entities, repository traits, identity and room types
//! - **Application Layer**: Services (identity verification, persistence) and DTOs
//! - **Infrastructure Layer**: Database pool, Postgres repositories, metrics
//! - **Presentation Layer**: HTTP handlers, middleware and the relay
//!
//! ## Module Structure
//!
//! ```text
//! chat_relay/
//! +-- config/         Configuration management
//! +-- domain/         Domain entities, value objects, and traits
//! +-- application/    Application services and DTOs
//! +-- infrastructure/ Database and metrics implementations
//! +-- presentation/   HTTP routes and the WebSocket relay
//! +-- shared/         Common utilities (errors, snowflake IDs)
//! ```

// Configuration module
pub mod config;

// Domain layer
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
