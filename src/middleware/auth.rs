use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use sqlx::PgPool;
use tracing::warn;

use scholaris_auth::verify_token;
use scholaris_core::AppError;
use scholaris_models::{Identity, User, ids::UserId};

use crate::state::AppState;

/// Extractor that authenticates the bearer token and loads the caller.
///
/// The token only names the user. Role, school and the active flag come from
/// the database, so disabling a user locks them out immediately. The loaded
/// [`Identity`] is cached in the request extensions, so role extractors and
/// handlers in the same request share one lookup.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl AuthUser {
    pub fn identity(&self) -> &Identity {
        &self.0
    }

    pub fn user_id(&self) -> UserId {
        self.0.id
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(AuthUser(identity.clone()));
        }

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::unauthorized("Not authorized, no token."))?;

        let claims = verify_token(bearer.token(), &state.jwt_config)?;
        let user_id = claims
            .user_id()
            .ok_or_else(|| AppError::unauthorized("Invalid user ID in token"))?;

        let identity = load_identity(&state.db, UserId::from(user_id)).await?;
        parts.extensions.insert(identity.clone());

        Ok(AuthUser(identity))
    }
}

/// Loads the caller's identity, rejecting unknown, disabled or school-less users.
pub async fn load_identity(db: &PgPool, user_id: UserId) -> Result<Identity, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, full_name, role, school_id, is_active, created_at FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    let user = match user {
        Some(user) if user.is_active => user,
        _ => {
            warn!(user.id = %user_id, "Token for missing or disabled user");
            return Err(AppError::unauthorized("User not found or disabled."));
        }
    };

    if !user.role.is_super_admin() && user.school_id.is_none() {
        warn!(user.id = %user.id, role = %user.role, "User has no school assignment");
        return Err(AppError::forbidden(
            "Forbidden: You are not assigned to a school.",
        ));
    }

    Ok(Identity::from(user))
}
