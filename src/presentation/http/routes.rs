//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{get, patch, post, put},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::{
    auth_middleware, create_cors_layer, create_trace_layer, record_metrics,
};
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        // Relay endpoint; the handshake authenticates before upgrading
        .route("/gateway", get(ws_handler))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(record_metrics))
        .layer(create_trace_layer())
        .layer(create_cors_layer(&state.settings.cors))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// API v1 routes, all behind bearer authentication
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/users", user_routes())
        .nest("/servers", server_routes())
        .nest("/channels", channel_routes())
        .nest("/messages", message_routes())
        .route("/invites/join/{code}", post(handlers::invite::join_by_invite))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// User routes
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(handlers::user::search_users))
        .route(
            "/@me",
            get(handlers::user::get_current_user).patch(handlers::user::update_current_user),
        )
        .route("/@me/status", put(handlers::user::update_status))
        .route("/@me/servers", get(handlers::user::get_user_servers))
        .route("/@me/friends", get(handlers::user::get_friends))
        .route("/{user_id}", get(handlers::user::get_user))
        .route(
            "/{user_id}/friends",
            post(handlers::user::add_friend).delete(handlers::user::remove_friend),
        )
}

/// Server routes
fn server_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::server::create_server))
        .route("/search", get(handlers::server::search_servers))
        .route(
            "/{server_id}",
            get(handlers::server::get_server)
                .patch(handlers::server::update_server)
                .delete(handlers::server::delete_server),
        )
        .route("/{server_id}/channels", post(handlers::server::create_channel))
        .route("/{server_id}/invites", post(handlers::invite::create_invite))
        .route("/{server_id}/stats", get(handlers::server::get_server_stats))
}

/// Channel routes
fn channel_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(handlers::channel::search_channels))
        .route(
            "/{channel_id}",
            get(handlers::channel::get_channel)
                .patch(handlers::channel::update_channel)
                .delete(handlers::channel::delete_channel),
        )
        .route("/{channel_id}/pin", put(handlers::channel::pin_message))
        .route("/{channel_id}/unpin", put(handlers::channel::unpin_message))
        .route("/{channel_id}/messages", get(handlers::message::get_messages))
}

/// Message routes
fn message_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/{message_id}",
            patch(handlers::message::edit_message).delete(handlers::message::delete_message),
        )
        .route(
            "/{message_id}/reactions",
            post(handlers::message::add_reaction).delete(handlers::message::remove_reaction),
        )
}
