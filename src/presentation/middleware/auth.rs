//! Authentication Middleware
//!
//! Bearer credential validation for protected routes.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::application::services::AuthError;
use crate::domain::Identity;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Authenticated user extension
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub identity: Identity,
}

impl AuthUser {
    pub fn user_id(&self) -> i64 {
        self.identity.user_id
    }
}

/// Authentication middleware that resolves the bearer token to an identity
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extract Authorization header
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    // Check for Bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".into()))?;

    let identity = state.identity.verify(token).await.map_err(|e| match e {
        AuthError::TokenExpired => AppError::Unauthorized("Token expired".into()),
        AuthError::Internal(msg) => AppError::Internal(msg),
        _ => AppError::Unauthorized("Invalid token".into()),
    })?;

    // Insert authenticated user into request extensions
    request.extensions_mut().insert(AuthUser { identity });

    Ok(next.run(request).await)
}
