use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use scholaris_core::PaginationParams;
use scholaris_core::serde::deserialize_optional_uuid;
use scholaris_models::{
    canteen::PosOrder,
    ids::{CanteenItemId, StudentId},
};
use uuid::Uuid;

use crate::validator::validate_positive_amount;

pub const MAX_LINE_QUANTITY: i32 = 50;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemDto {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(custom(function = "validate_positive_amount"))]
    pub price: Decimal,
    #[validate(length(max = 60))]
    pub category: Option<String>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItemDto {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_positive_amount"))]
    pub price: Option<Decimal>,
    #[validate(length(max = 60))]
    pub category: Option<String>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemFilterParams {
    pub available_only: Option<bool>,
}

fn default_quantity() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderLineDto {
    pub id: CanteenItemId,
    /// Fractional quantities are floored; anything below one counts as one.
    #[serde(default = "default_quantity")]
    #[validate(range(max = 50.0))]
    pub quantity: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderDto {
    pub student_id: StudentId,
    #[serde(alias = "itemIds", alias = "item_ids")]
    #[validate(length(min = 1, max = 50), nested)]
    pub items: Vec<OrderLineDto>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub student_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// Joined row for order listings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PosOrderRow {
    #[sqlx(flatten)]
    pub order: PosOrder,
    pub student_name: String,
}

#[derive(Debug, Serialize)]
pub struct CardVerification {
    pub student_id: StudentId,
    pub full_name: String,
    pub grade: Option<String>,
    pub wallet_balance: Decimal,
    pub daily_spending_limit: Option<Decimal>,
    pub spent_today: Decimal,
}
