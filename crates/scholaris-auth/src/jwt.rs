//! Token creation and verification.
//!
//! The API never issues tokens over HTTP; [`create_access_token`] exists for the
//! CLI (`scholaris-cli issue-token`) and for tests. Every request goes through
//! [`verify_token`].
//!
//! # Example
//!
//! ```ignore
//! use scholaris_auth::{create_access_token, verify_token};
//! use scholaris_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, "admin@school.jo", &config)?;
//! let claims = verify_token(&token, &config)?;
//! ```

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;
use uuid::Uuid;

use scholaris_config::JwtConfig;
use scholaris_core::AppError;

use crate::claims::Claims;

/// Creates a signed HS256 access token for `user_id`.
///
/// # Errors
///
/// Returns a server error if encoding fails.
pub fn create_access_token(
    user_id: Uuid,
    email: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.access_token_expiry.max(0) as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow::Error::from(e).context("Failed to create token")))
}

/// Verifies signature and expiry and returns the embedded claims.
///
/// # Errors
///
/// Returns 401 `UNAUTHORIZED` for any invalid, expired or malformed token.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        debug!(error = %e, "Rejected bearer token");
        AppError::unauthorized("Invalid or expired token")
    })
}
