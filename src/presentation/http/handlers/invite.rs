//! Invite Handlers
//!
//! Creating join codes for a server and joining through them.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::response::{InviteResponse, ServerResponse};
use crate::application::services::{ServerService, ServerServiceImpl};
use crate::infrastructure::repositories::{PgChannelRepository, PgServerRepository};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::parse_id;
use crate::startup::AppState;

fn server_service(state: &AppState) -> ServerServiceImpl<PgServerRepository, PgChannelRepository> {
    ServerServiceImpl::new(
        Arc::new(PgServerRepository::new(state.db.clone())),
        Arc::new(PgChannelRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

/// Create an invite for a server
///
/// POST /api/v1/servers/{server_id}/invites
///
/// Any member of the server may create one.
pub async fn create_invite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(server_id): Path<String>,
) -> Result<(StatusCode, Json<InviteResponse>), AppError> {
    let server_id = parse_id(&server_id, "server")?;

    let invite = server_service(&state)
        .create_invite(server_id, auth.user_id())
        .await?;

    Ok((StatusCode::CREATED, Json(InviteResponse::from(invite))))
}

/// Join a server by invite code
///
/// POST /api/v1/invites/join/{code}
///
/// Unknown codes are 404; joining a server twice is 400.
pub async fn join_by_invite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(code): Path<String>,
) -> Result<Json<ServerResponse>, AppError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(AppError::BadRequest("Invite code is required".into()));
    }

    let server = server_service(&state)
        .join_by_invite(code, auth.user_id())
        .await?;

    Ok(Json(ServerResponse::from(server)))
}
