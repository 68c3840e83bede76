//! Channel Handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{PinMessageRequest, SearchQuery, UpdateChannelRequest};
use crate::application::dto::response::{ChannelResponse, PinnedMessageResponse};
use crate::application::services::{ChannelService, ChannelServiceImpl, UpdateChannelDto};
use crate::infrastructure::repositories::{
    PgChannelRepository, PgMessageRepository, PgServerRepository,
};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::{parse_id, require_search_query, validate_request};
use crate::startup::AppState;

type PgChannelService =
    ChannelServiceImpl<PgChannelRepository, PgServerRepository, PgMessageRepository>;

fn channel_service(state: &AppState) -> PgChannelService {
    ChannelServiceImpl::new(
        Arc::new(PgChannelRepository::new(state.db.clone())),
        Arc::new(PgServerRepository::new(state.db.clone())),
        Arc::new(PgMessageRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

/// Get channel by ID
pub async fn get_channel(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<Json<ChannelResponse>, AppError> {
    let channel_id = parse_id(&channel_id, "channel")?;

    let channel = channel_service(&state).get_channel(channel_id).await?;

    Ok(Json(ChannelResponse::from(channel)))
}

/// Update channel (server owner only)
pub async fn update_channel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(channel_id): Path<String>,
    Json(body): Json<UpdateChannelRequest>,
) -> Result<Json<ChannelResponse>, AppError> {
    let channel_id = parse_id(&channel_id, "channel")?;
    validate_request(&body)?;

    let update = UpdateChannelDto {
        name: body.name,
        channel_type: body.channel_type,
        description: body.description,
    };
    let channel = channel_service(&state)
        .update_channel(channel_id, auth.user_id(), update)
        .await?;

    Ok(Json(ChannelResponse::from(channel)))
}

/// Delete channel (server owner only)
pub async fn delete_channel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(channel_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let channel_id = parse_id(&channel_id, "channel")?;

    channel_service(&state)
        .delete_channel(channel_id, auth.user_id())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Search channels by name
pub async fn search_channels(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<ChannelResponse>>, AppError> {
    let query = require_search_query(params.query.as_deref())?;

    let channels = channel_service(&state).search_channels(query).await?;

    Ok(Json(channels.into_iter().map(ChannelResponse::from).collect()))
}

/// Pin a message of this channel
pub async fn pin_message(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Json(body): Json<PinMessageRequest>,
) -> Result<Json<PinnedMessageResponse>, AppError> {
    let channel_id = parse_id(&channel_id, "channel")?;
    let message_id = parse_id(&body.message_id, "message")?;

    let channel = channel_service(&state)
        .pin_message(channel_id, message_id)
        .await?;

    Ok(Json(PinnedMessageResponse::from(channel)))
}

/// Clear the pinned message
pub async fn unpin_message(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<Json<PinnedMessageResponse>, AppError> {
    let channel_id = parse_id(&channel_id, "channel")?;

    let channel = channel_service(&state).unpin_message(channel_id).await?;

    Ok(Json(PinnedMessageResponse::from(channel)))
}
