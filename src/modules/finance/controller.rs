use axum::extract::{Path, Query, State};
use tracing::instrument;

use scholaris_core::{ApiResponse, AppError};
use scholaris_models::{
    ids::InvoiceId,
    invoices::{FeeStructure, Invoice, ScopedInvoice},
};

use crate::middleware::auth::AuthUser;
use crate::modules::finance::model::{
    CreateFeeStructureDto, InvoiceDetail, InvoiceFilterParams, IssueInvoiceDto, RecordPaymentDto,
};
use crate::modules::finance::service::FinanceService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

// Role gating for these handlers is applied by the router's route layer.

#[instrument(skip(state, auth_user))]
pub async fn create_fee_structure(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateFeeStructureDto>,
) -> Result<ApiResponse<FeeStructure>, AppError> {
    let fee = FinanceService::create_fee_structure(&state.db, auth_user.identity(), dto).await?;
    Ok(ApiResponse::created(fee))
}

#[instrument(skip(state, auth_user))]
pub async fn get_fee_structures(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<ApiResponse<Vec<FeeStructure>>, AppError> {
    let fees = FinanceService::list_fee_structures(&state.db, auth_user.identity()).await?;
    Ok(ApiResponse::ok(fees))
}

#[instrument(skip(state, auth_user))]
pub async fn issue_invoice(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<IssueInvoiceDto>,
) -> Result<ApiResponse<Invoice>, AppError> {
    let invoice = FinanceService::issue_invoice(&state.db, auth_user.identity(), dto).await?;
    Ok(ApiResponse::created(invoice))
}

#[instrument(skip(state, auth_user))]
pub async fn get_invoices(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<InvoiceFilterParams>,
) -> Result<ApiResponse<Vec<ScopedInvoice>>, AppError> {
    let (invoices, meta) =
        FinanceService::list_invoices(&state.db, auth_user.identity(), &params).await?;
    Ok(ApiResponse::ok(invoices).with_meta(meta))
}

#[instrument(skip(state, auth_user))]
pub async fn get_invoice(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<InvoiceId>,
) -> Result<ApiResponse<InvoiceDetail>, AppError> {
    let invoice = FinanceService::get_invoice(&state.db, auth_user.identity(), id).await?;
    Ok(ApiResponse::ok(invoice))
}

#[instrument(skip(state, auth_user))]
pub async fn record_payment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(invoice_id): Path<InvoiceId>,
    ValidatedJson(dto): ValidatedJson<RecordPaymentDto>,
) -> Result<ApiResponse<Invoice>, AppError> {
    let invoice =
        FinanceService::record_payment(&state.db, auth_user.identity(), invoice_id, dto).await?;
    Ok(ApiResponse::ok(invoice))
}
