//! User Handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{SearchQuery, UpdateStatusRequest, UpdateUserRequest};
use crate::application::dto::response::{ServerResponse, StatusResponse, UserResponse};
use crate::application::services::{
    ServerService, ServerServiceImpl, UpdateProfileDto, UserError, UserService, UserServiceImpl,
};
use crate::infrastructure::repositories::{
    PgChannelRepository, PgServerRepository, PgUserRepository,
};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::{parse_id, require_search_query, validate_request};
use crate::startup::AppState;

fn user_service(state: &AppState) -> UserServiceImpl<PgUserRepository> {
    UserServiceImpl::new(Arc::new(PgUserRepository::new(state.db.clone())))
}

/// Get current authenticated user
pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserResponse>, AppError> {
    let user = user_service(&state).get_user(auth.user_id()).await?;
    let presence = state.relay.presence_of(user.id);

    Ok(Json(UserResponse::with_presence(user, presence)))
}

/// Update current user profile
pub async fn update_current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    validate_request(&body)?;

    let update = UpdateProfileDto {
        username: body.username,
        avatar_url: body.avatar_url,
    };
    let user = user_service(&state)
        .update_profile(auth.user_id(), update)
        .await?;
    let presence = state.relay.presence_of(user.id);

    Ok(Json(UserResponse::with_presence(user, presence)))
}

/// Get a user by ID; status reflects live presence
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let user_id = parse_id(&user_id, "user")?;

    let user = user_service(&state).get_user(user_id).await?;
    let presence = state.relay.presence_of(user.id);

    Ok(Json(UserResponse::with_presence(user, presence)))
}

/// Search users by username
pub async fn search_users(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let query = require_search_query(params.query.as_deref())?;

    let users = user_service(&state).search_users(query).await?;
    let responses = users
        .into_iter()
        .map(|user| {
            let presence = state.relay.presence_of(user.id);
            UserResponse::with_presence(user, presence)
        })
        .collect();

    Ok(Json(responses))
}

/// Set the current user's status: stored, then announced on the relay
pub async fn update_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    let status = user_service(&state)
        .update_status(auth.user_id(), &body.status)
        .await?;

    state.relay.set_presence(auth.user_id(), status);

    Ok(Json(StatusResponse {
        user_id: auth.user_id().to_string(),
        status,
    }))
}

/// Servers the current user is a member of
pub async fn get_user_servers(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<ServerResponse>>, AppError> {
    let server_service = ServerServiceImpl::new(
        Arc::new(PgServerRepository::new(state.db.clone())),
        Arc::new(PgChannelRepository::new(state.db.clone())),
        state.snowflake.clone(),
    );

    let servers = server_service.get_user_servers(auth.user_id()).await?;

    Ok(Json(servers.into_iter().map(ServerResponse::from).collect()))
}

/// Friends of the current user
pub async fn get_friends(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let friends = user_service(&state).get_friends(auth.user_id()).await?;
    let responses = friends
        .into_iter()
        .map(|user| {
            let presence = state.relay.presence_of(user.id);
            UserResponse::with_presence(user, presence)
        })
        .collect();

    Ok(Json(responses))
}

/// Add a user to the current user's friends
pub async fn add_friend(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let friend_id = parse_id(&user_id, "user")?;
    if friend_id == auth.user_id() {
        return Err(UserError::SelfFriend.into());
    }

    let friend = user_service(&state)
        .add_friend(auth.user_id(), friend_id)
        .await?;
    let presence = state.relay.presence_of(friend.id);

    Ok((StatusCode::CREATED, Json(UserResponse::with_presence(friend, presence))))
}

/// Remove a user from the current user's friends
pub async fn remove_friend(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let friend_id = parse_id(&user_id, "user")?;

    user_service(&state)
        .remove_friend(auth.user_id(), friend_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
