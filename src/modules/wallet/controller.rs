use axum::extract::{Path, State};
use tracing::instrument;

use scholaris_core::{ApiResponse, AppError};
use scholaris_models::{WalletTransaction, ids::StudentId};

use crate::middleware::role::{RequireSchoolAdmin, RequireWalletFunder, RequireWalletViewer};
use crate::modules::wallet::model::{AdjustmentDto, HistoryMeta, HistoryQuery, TopUpDto, WalletChange};
use crate::modules::wallet::service::WalletService;
use crate::state::AppState;
use crate::validator::{ValidatedJson, ValidatedQuery};

#[instrument(skip(state, auth_user))]
pub async fn top_up_wallet(
    State(state): State<AppState>,
    RequireWalletFunder(auth_user): RequireWalletFunder,
    ValidatedJson(dto): ValidatedJson<TopUpDto>,
) -> Result<ApiResponse<WalletChange>, AppError> {
    let change = WalletService::top_up(&state.db, auth_user.identity(), dto).await?;
    Ok(ApiResponse::ok(change))
}

#[instrument(skip(state, auth_user))]
pub async fn adjust_wallet(
    State(state): State<AppState>,
    RequireSchoolAdmin(auth_user): RequireSchoolAdmin,
    ValidatedJson(dto): ValidatedJson<AdjustmentDto>,
) -> Result<ApiResponse<WalletChange>, AppError> {
    let change = WalletService::adjust(&state.db, auth_user.identity(), dto).await?;
    Ok(ApiResponse::ok(change))
}

#[instrument(skip(state, auth_user))]
pub async fn get_wallet_history(
    State(state): State<AppState>,
    RequireWalletViewer(auth_user): RequireWalletViewer,
    Path(student_id): Path<StudentId>,
    ValidatedQuery(query): ValidatedQuery<HistoryQuery>,
) -> Result<ApiResponse<Vec<WalletTransaction>>, AppError> {
    let (student, transactions) =
        WalletService::history(&state.db, auth_user.identity(), student_id, &query).await?;

    let meta = HistoryMeta {
        student_id: student.id,
        wallet_balance: student.wallet_balance,
        count: transactions.len(),
    };
    Ok(ApiResponse::ok(transactions).with_meta(meta))
}
