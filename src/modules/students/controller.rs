use axum::extract::{Path, State};
use tracing::instrument;

use scholaris_core::{ApiResponse, AppError};
use scholaris_models::{ids::StudentId, students::WalletSummary};

use crate::middleware::role::{RequireParent, RequireSchoolAdmin, RequireWalletFunder, RequireWalletViewer};
use crate::modules::students::model::{AssignNfcDto, NfcStatusDto, SpendingLimitDto, StudentWallet};
use crate::modules::students::service::StudentService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[instrument(skip(state, auth_user))]
pub async fn get_student_wallet(
    State(state): State<AppState>,
    RequireWalletViewer(auth_user): RequireWalletViewer,
    Path(id): Path<StudentId>,
) -> Result<ApiResponse<StudentWallet>, AppError> {
    let wallet = StudentService::get_wallet(&state.db, auth_user.identity(), id).await?;
    Ok(ApiResponse::ok(wallet))
}

#[instrument(skip(state, auth_user))]
pub async fn get_my_children(
    State(state): State<AppState>,
    RequireParent(auth_user): RequireParent,
) -> Result<ApiResponse<Vec<WalletSummary>>, AppError> {
    let children = StudentService::get_children(&state.db, auth_user.identity()).await?;
    let count = children.len();
    Ok(ApiResponse::ok(children).with_meta(serde_json::json!({ "count": count })))
}

#[instrument(skip(state, auth_user))]
pub async fn assign_nfc(
    State(state): State<AppState>,
    RequireSchoolAdmin(auth_user): RequireSchoolAdmin,
    Path(id): Path<StudentId>,
    ValidatedJson(dto): ValidatedJson<AssignNfcDto>,
) -> Result<ApiResponse<WalletSummary>, AppError> {
    let summary =
        StudentService::assign_nfc(&state.db, auth_user.identity(), id, dto.nfc_card_id).await?;
    Ok(ApiResponse::ok(summary))
}

#[instrument(skip(state, auth_user))]
pub async fn set_nfc_status(
    State(state): State<AppState>,
    RequireWalletFunder(auth_user): RequireWalletFunder,
    Path(id): Path<StudentId>,
    ValidatedJson(dto): ValidatedJson<NfcStatusDto>,
) -> Result<ApiResponse<WalletSummary>, AppError> {
    let summary =
        StudentService::set_nfc_status(&state.db, auth_user.identity(), id, dto.is_active).await?;
    Ok(ApiResponse::ok(summary))
}

#[instrument(skip(state, auth_user))]
pub async fn set_spending_limit(
    State(state): State<AppState>,
    RequireWalletFunder(auth_user): RequireWalletFunder,
    Path(id): Path<StudentId>,
    ValidatedJson(dto): ValidatedJson<SpendingLimitDto>,
) -> Result<ApiResponse<WalletSummary>, AppError> {
    let summary = StudentService::set_spending_limit(
        &state.db,
        auth_user.identity(),
        id,
        dto.daily_spending_limit,
    )
    .await?;
    Ok(ApiResponse::ok(summary))
}
