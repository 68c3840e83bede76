//! Message Handlers
//!
//! History, edits, deletes and reactions. New messages arrive over the relay;
//! edits and deletes made here are pushed to the channel's room.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{EditMessageRequest, MessageQueryParams, ReactionRequest};
use crate::application::dto::response::{MessageResponse, ReactionResponse};
use crate::application::services::MessageQueryDto;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::{parse_id, validate_request};
use crate::startup::AppState;

fn parse_cursor(raw: Option<String>, what: &str) -> Result<Option<i64>, AppError> {
    raw.map(|s| parse_id(&s, what)).transpose()
}

/// Get a page of channel history
pub async fn get_messages(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Query(query): Query<MessageQueryParams>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    let channel_id = parse_id(&channel_id, "channel")?;

    let query = MessageQueryDto {
        before: parse_cursor(query.before, "before")?,
        after: parse_cursor(query.after, "after")?,
        limit: query.limit,
    };

    let messages = state.messages.get_messages(channel_id, query).await?;

    Ok(Json(messages.into_iter().map(MessageResponse::from).collect()))
}

/// Edit a message (author only)
pub async fn edit_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(message_id): Path<String>,
    Json(body): Json<EditMessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let message_id = parse_id(&message_id, "message")?;
    validate_request(&body)?;

    let message = state
        .messages
        .edit_message(message_id, auth.user_id(), body.content)
        .await?;

    state.relay.broadcast_message_update(message.clone());

    Ok(Json(MessageResponse::from(message)))
}

/// Delete a message (author only)
pub async fn delete_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(message_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let message_id = parse_id(&message_id, "message")?;

    let removed = state
        .messages
        .delete_message(message_id, auth.user_id())
        .await?;

    state.relay.broadcast_message_delete(&removed);

    Ok(StatusCode::NO_CONTENT)
}

/// Add the caller's reaction
pub async fn add_reaction(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(message_id): Path<String>,
    Json(body): Json<ReactionRequest>,
) -> Result<Json<Vec<ReactionResponse>>, AppError> {
    let message_id = parse_id(&message_id, "message")?;
    validate_request(&body)?;

    let groups = state
        .messages
        .add_reaction(message_id, auth.user_id(), body.emoji)
        .await?;

    Ok(Json(groups.into_iter().map(ReactionResponse::from).collect()))
}

/// Remove the caller's reaction
pub async fn remove_reaction(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(message_id): Path<String>,
    Json(body): Json<ReactionRequest>,
) -> Result<Json<Vec<ReactionResponse>>, AppError> {
    let message_id = parse_id(&message_id, "message")?;
    validate_request(&body)?;

    let groups = state
        .messages
        .remove_reaction(message_id, auth.user_id(), body.emoji)
        .await?;

    Ok(Json(groups.into_iter().map(ReactionResponse::from).collect()))
}
