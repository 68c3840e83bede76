//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use sqlx::PgPool;
use tokio::net::TcpListener;

use crate::application::services::{
    IdentityVerifier, JwtIdentityVerifier, MessageService, MessageServiceImpl,
};
use crate::config::Settings;
use crate::infrastructure::database;
use crate::infrastructure::repositories::{
    PgChannelRepository, PgMessageRepository, PgReactionRepository, PgUserRepository,
};
use crate::presentation::http::routes;
use crate::presentation::websocket::Relay;
use crate::shared::snowflake::SnowflakeGenerator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub snowflake: Arc<SnowflakeGenerator>,
    pub relay: Arc<Relay>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub messages: Arc<dyn MessageService>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Wire the Postgres-backed collaborators around an existing pool.
    pub fn new(db: PgPool, settings: Settings) -> Self {
        let snowflake = Arc::new(SnowflakeGenerator::new(
            settings.snowflake.machine_id as u64,
            0u64, // Default node_id
        ));

        let users = Arc::new(PgUserRepository::new(db.clone()));
        let identity: Arc<dyn IdentityVerifier> =
            Arc::new(JwtIdentityVerifier::new(users, &settings.jwt));

        let messages: Arc<dyn MessageService> = Arc::new(MessageServiceImpl::new(
            Arc::new(PgMessageRepository::new(db.clone())),
            Arc::new(PgChannelRepository::new(db.clone())),
            Arc::new(PgReactionRepository::new(db.clone())),
            snowflake.clone(),
            settings.relay.max_content_length,
        ));

        let relay = Arc::new(Relay::new(messages.clone(), settings.relay.clone()));

        Self {
            db,
            snowflake,
            relay,
            identity,
            messages,
            settings: Arc::new(settings),
        }
    }
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        // Create database pool
        let db = database::create_pool(&settings.database).await?;
        tracing::info!("Database connection pool created");

        database::run_migrations(&db).await?;
        tracing::info!("Database migrations applied");

        let addr: SocketAddr = settings.server_addr().parse()?;
        let state = AppState::new(db, settings);
        let router = routes::create_router(state);

        // Bind to address
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
