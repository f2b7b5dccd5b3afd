use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use scholaris_core::{ApiResponse, AppError};
use scholaris_models::{
    canteen::{CanteenItem, PosOrderDetail},
    ids::{CanteenItemId, PosOrderId},
};

use crate::middleware::auth::AuthUser;
use crate::middleware::role::{RequirePosStaff, RequireSchoolAdmin};
use crate::modules::pos::model::{
    CardVerification, CreateItemDto, CreateOrderDto, ItemFilterParams, OrderFilterParams,
    UpdateItemDto,
};
use crate::modules::pos::service::PosService;
use crate::state::AppState;
use crate::validator::{ValidatedJson, validate_nfc_id};

#[instrument(skip(state, auth_user))]
pub async fn get_items(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<ItemFilterParams>,
) -> Result<ApiResponse<Vec<CanteenItem>>, AppError> {
    let items = PosService::list_items(&state.db, auth_user.identity(), &params).await?;
    Ok(ApiResponse::ok(items))
}

#[instrument(skip(state, auth_user))]
pub async fn create_item(
    State(state): State<AppState>,
    RequireSchoolAdmin(auth_user): RequireSchoolAdmin,
    ValidatedJson(dto): ValidatedJson<CreateItemDto>,
) -> Result<ApiResponse<CanteenItem>, AppError> {
    let item = PosService::create_item(&state.db, auth_user.identity(), dto).await?;
    Ok(ApiResponse::created(item))
}

#[instrument(skip(state, auth_user))]
pub async fn update_item(
    State(state): State<AppState>,
    RequireSchoolAdmin(auth_user): RequireSchoolAdmin,
    Path(id): Path<CanteenItemId>,
    ValidatedJson(dto): ValidatedJson<UpdateItemDto>,
) -> Result<ApiResponse<CanteenItem>, AppError> {
    let item = PosService::update_item(&state.db, auth_user.identity(), id, dto).await?;
    Ok(ApiResponse::ok(item))
}

#[instrument(skip(state, auth_user))]
pub async fn delete_item(
    State(state): State<AppState>,
    RequireSchoolAdmin(auth_user): RequireSchoolAdmin,
    Path(id): Path<CanteenItemId>,
) -> Result<StatusCode, AppError> {
    PosService::delete_item(&state.db, auth_user.identity(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, auth_user))]
pub async fn create_order(
    State(state): State<AppState>,
    RequirePosStaff(auth_user): RequirePosStaff,
    ValidatedJson(dto): ValidatedJson<CreateOrderDto>,
) -> Result<ApiResponse<PosOrderDetail>, AppError> {
    let order =
        PosService::create_order(&state.db, &state.notifier, auth_user.identity(), dto).await?;
    Ok(ApiResponse::created(order))
}

#[instrument(skip(state, auth_user))]
pub async fn get_orders(
    State(state): State<AppState>,
    RequirePosStaff(auth_user): RequirePosStaff,
    Query(params): Query<OrderFilterParams>,
) -> Result<ApiResponse<Vec<PosOrderDetail>>, AppError> {
    let (orders, meta) = PosService::list_orders(&state.db, auth_user.identity(), &params).await?;
    Ok(ApiResponse::ok(orders).with_meta(meta))
}

#[instrument(skip(state, auth_user))]
pub async fn get_order(
    State(state): State<AppState>,
    RequirePosStaff(auth_user): RequirePosStaff,
    Path(id): Path<PosOrderId>,
) -> Result<ApiResponse<PosOrderDetail>, AppError> {
    let order = PosService::get_order(&state.db, auth_user.identity(), id).await?;
    Ok(ApiResponse::ok(order))
}

#[instrument(skip(state, auth_user))]
pub async fn verify_card(
    State(state): State<AppState>,
    RequirePosStaff(auth_user): RequirePosStaff,
    Path(nfc_id): Path<String>,
) -> Result<ApiResponse<CardVerification>, AppError> {
    validate_nfc_id(&nfc_id).map_err(|e| {
        AppError::bad_request(anyhow::anyhow!(
            "{}",
            e.message.unwrap_or_else(|| "Invalid NFC id".into())
        ))
    })?;

    let verification = PosService::verify_card(&state.db, auth_user.identity(), &nfc_id).await?;
    Ok(ApiResponse::ok(verification))
}
