//! Server Handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{
    CreateChannelRequest, CreateServerRequest, SearchQuery, UpdateServerRequest,
};
use crate::application::dto::response::{
    ChannelResponse, ServerDetailResponse, ServerResponse, ServerStatsResponse,
};
use crate::application::services::{
    ChannelService, ChannelServiceImpl, CreateChannelDto, CreateServerDto, ServerService,
    ServerServiceImpl, UpdateServerDto,
};
use crate::infrastructure::repositories::{
    PgChannelRepository, PgMessageRepository, PgServerRepository,
};
use crate::domain::UserStatus;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::{parse_id, require_search_query, validate_request};
use crate::startup::AppState;

fn server_service(state: &AppState) -> ServerServiceImpl<PgServerRepository, PgChannelRepository> {
    ServerServiceImpl::new(
        Arc::new(PgServerRepository::new(state.db.clone())),
        Arc::new(PgChannelRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

/// Create a server owned by the caller
pub async fn create_server(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateServerRequest>,
) -> Result<(StatusCode, Json<ServerResponse>), AppError> {
    validate_request(&body)?;

    let server = server_service(&state)
        .create_server(
            auth.user_id(),
            CreateServerDto {
                name: body.name,
                icon_url: body.icon_url,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ServerResponse::from(server))))
}

/// Get a server with its channels
pub async fn get_server(
    State(state): State<AppState>,
    Path(server_id): Path<String>,
) -> Result<Json<ServerDetailResponse>, AppError> {
    let server_id = parse_id(&server_id, "server")?;

    let detail = server_service(&state).get_server(server_id).await?;

    Ok(Json(ServerDetailResponse::from(detail)))
}

/// Update a server (owner only)
pub async fn update_server(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(server_id): Path<String>,
    Json(body): Json<UpdateServerRequest>,
) -> Result<Json<ServerResponse>, AppError> {
    let server_id = parse_id(&server_id, "server")?;
    validate_request(&body)?;

    let server = server_service(&state)
        .update_server(
            server_id,
            auth.user_id(),
            UpdateServerDto {
                name: body.name,
                icon_url: body.icon_url,
            },
        )
        .await?;

    Ok(Json(ServerResponse::from(server)))
}

/// Delete a server (owner only)
pub async fn delete_server(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(server_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let server_id = parse_id(&server_id, "server")?;

    server_service(&state)
        .delete_server(server_id, auth.user_id())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Search servers by name
pub async fn search_servers(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<ServerResponse>>, AppError> {
    let query = require_search_query(params.query.as_deref())?;

    let servers = server_service(&state).search_servers(query).await?;

    Ok(Json(servers.into_iter().map(ServerResponse::from).collect()))
}

/// Member counts and per-channel message counts (members only).
/// Active members are those whose live presence is online.
pub async fn get_server_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(server_id): Path<String>,
) -> Result<Json<ServerStatsResponse>, AppError> {
    let server_id = parse_id(&server_id, "server")?;

    let stats = server_service(&state)
        .get_server_stats(server_id, auth.user_id())
        .await?;
    let active = stats
        .member_ids
        .iter()
        .filter(|id| state.relay.presence_of(**id) == UserStatus::Online)
        .count();

    Ok(Json(ServerStatsResponse::new(stats, active)))
}

/// Create a channel in a server (owner only)
pub async fn create_channel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(server_id): Path<String>,
    Json(body): Json<CreateChannelRequest>,
) -> Result<(StatusCode, Json<ChannelResponse>), AppError> {
    let server_id = parse_id(&server_id, "server")?;
    validate_request(&body)?;

    let channel_service = ChannelServiceImpl::new(
        Arc::new(PgChannelRepository::new(state.db.clone())),
        Arc::new(PgServerRepository::new(state.db.clone())),
        Arc::new(PgMessageRepository::new(state.db.clone())),
        state.snowflake.clone(),
    );

    let channel = channel_service
        .create_channel(
            server_id,
            auth.user_id(),
            CreateChannelDto {
                name: body.name,
                channel_type: body.channel_type,
                description: body.description,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ChannelResponse::from(channel))))
}
