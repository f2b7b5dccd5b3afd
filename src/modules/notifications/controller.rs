use axum::extract::{Path, Query, State};
use tracing::instrument;

use scholaris_core::{ApiResponse, AppError, PaginationParams};
use scholaris_models::{ids::NotificationId, notifications::Notification};

use crate::middleware::auth::AuthUser;
use crate::modules::notifications::service::NotificationService;
use crate::state::AppState;

#[instrument(skip(state, auth_user))]
pub async fn get_notifications(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<ApiResponse<Vec<Notification>>, AppError> {
    let (notifications, meta) =
        NotificationService::list_for_user(&state.db, auth_user.user_id(), &params).await?;
    Ok(ApiResponse::ok(notifications).with_meta(meta))
}

#[instrument(skip(state, auth_user))]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<NotificationId>,
) -> Result<ApiResponse<Notification>, AppError> {
    let notification =
        NotificationService::mark_read(&state.db, auth_user.user_id(), id).await?;
    Ok(ApiResponse::ok(notification))
}
