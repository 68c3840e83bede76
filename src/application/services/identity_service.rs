//! Identity Service
//!
//! Verifies bearer credentials issued by the external identity service and
//! resolves them to a user identity. The same verifier backs the REST auth
//! middleware and the relay handshake.

use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtSettings;
use crate::domain::{Identity, UserRepository};

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
}

/// Credential verification errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Unknown user")]
    UnknownSubject,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Resolves a bearer credential to an identity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

/// HS256 verifier backed by the users table.
pub struct JwtIdentityVerifier<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl<U> JwtIdentityVerifier<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, settings: &JwtSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = settings.leeway_secs;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            user_repo,
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            validation,
        }
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }
}

#[async_trait]
impl<U> IdentityVerifier for JwtIdentityVerifier<U>
where
    U: UserRepository + 'static,
{
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.decode_claims(token)?;

        let user_id: i64 = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;

        let user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::UnknownSubject)?;

        Ok(Identity::from(user))
    }
}
