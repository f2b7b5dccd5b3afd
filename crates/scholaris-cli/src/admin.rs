//! Account bootstrap commands.

use scholaris_auth::create_access_token;
use scholaris_config::JwtConfig;
use scholaris_models::{Role, ids::UserId};
use sqlx::PgPool;

/// Creates a super admin. Super admins have no school and can only be created here.
pub async fn create_super_admin(
    db: &PgPool,
    email: &str,
    full_name: &str,
) -> Result<UserId, Box<dyn std::error::Error>> {
    let user_id = sqlx::query_scalar::<_, UserId>(
        "INSERT INTO users (email, full_name, role, school_id)
         VALUES ($1, $2, $3, NULL)
         ON CONFLICT (email) DO NOTHING
         RETURNING id",
    )
    .bind(email)
    .bind(full_name)
    .bind(Role::SuperAdmin)
    .fetch_optional(db)
    .await?;

    user_id.ok_or_else(|| "User with this email already exists".into())
}

/// Issues an access token for an existing, active user.
pub async fn issue_token(
    db: &PgPool,
    email: &str,
    jwt_config: &JwtConfig,
) -> Result<String, Box<dyn std::error::Error>> {
    let user_id = sqlx::query_scalar::<_, UserId>(
        "SELECT id FROM users WHERE email = $1 AND is_active = TRUE",
    )
    .bind(email)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| format!("No active user with email {email}"))?;

    let token = create_access_token(user_id.into_inner(), email, jwt_config)
        .map_err(|e| format!("Failed to sign token: {e}"))?;
    Ok(token)
}
