use serde_json::Value;
use sqlx::PgConnection;
use tracing::debug;

use scholaris_models::{Identity, audit::AuditAction, ids::SchoolId};

/// One audit record, written in the same transaction as the change it describes.
#[derive(Debug)]
pub struct AuditEntry<'a> {
    pub actor: &'a Identity,
    pub action: AuditAction,
    pub details: Value,
    pub school_id: Option<SchoolId>,
}

pub async fn log_audit(conn: &mut PgConnection, entry: AuditEntry<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (user_id, user_email, action_type, details, school_id)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(entry.actor.id)
    .bind(&entry.actor.email)
    .bind(entry.action.as_str())
    .bind(sqlx::types::Json(&entry.details))
    .bind(entry.school_id)
    .execute(&mut *conn)
    .await?;

    debug!(action = %entry.action, user.id = %entry.actor.id, "Audit entry written");
    Ok(())
}
