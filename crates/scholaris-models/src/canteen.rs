//! Canteen catalogue and point-of-sale orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::ids::{CanteenItemId, PosOrderId, PosOrderItemId, SchoolId, StudentId, UserId, WalletTxnId};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CanteenItem {
    pub id: CanteenItemId,
    pub school_id: SchoolId,
    pub name: String,
    pub price: Decimal,
    pub category: Option<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "pos_order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PosOrderStatus {
    Completed,
    Refunded,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PosOrder {
    pub id: PosOrderId,
    pub school_id: SchoolId,
    pub student_id: StudentId,
    pub total: Decimal,
    pub status: PosOrderStatus,
    pub paid_by_wallet: bool,
    pub wallet_txn_id: Option<WalletTxnId>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// An order line. `item_name`, `unit_price` and `line_total` are snapshots
/// taken at purchase time; `item_id` is cleared if the item is later deleted.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PosOrderLine {
    pub id: PosOrderItemId,
    pub order_id: PosOrderId,
    pub item_id: Option<CanteenItemId>,
    pub item_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// An order with its student name and lines, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct PosOrderDetail {
    #[serde(flatten)]
    pub order: PosOrder,
    pub student_name: String,
    pub items: Vec<PosOrderLine>,
}

impl PosOrderDetail {
    /// True when the stored total equals the sum of the line totals.
    pub fn is_balanced(&self) -> bool {
        self.items.iter().map(|line| line.line_total).sum::<Decimal>() == self.order.total
    }
}
