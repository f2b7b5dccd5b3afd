use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use scholaris_core::serde::deserialize_optional_datetime;
use scholaris_models::{WalletTransaction, WalletTxnType, ids::StudentId};

use crate::validator::{validate_signed_amount, validate_topup_amount};

pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

#[derive(Debug, Deserialize, Validate)]
pub struct TopUpDto {
    pub student_id: StudentId,
    #[validate(custom(function = "validate_topup_amount"))]
    pub amount: Decimal,
}

/// Manual corrections by a school admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Refund,
    Adjustment,
}

impl From<AdjustmentKind> for WalletTxnType {
    fn from(kind: AdjustmentKind) -> Self {
        match kind {
            AdjustmentKind::Refund => WalletTxnType::Refund,
            AdjustmentKind::Adjustment => WalletTxnType::Adjustment,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdjustmentDto {
    pub student_id: StudentId,
    /// Signed; refunds must be positive.
    #[validate(custom(function = "validate_signed_amount"))]
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: AdjustmentKind,
    #[validate(length(min = 1, max = 255))]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct HistoryQuery {
    #[validate(range(min = 1, max = 200))]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub from: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub to: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub txn_type: Option<WalletTxnType>,
}

impl HistoryQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_HISTORY_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct WalletChange {
    pub transaction: WalletTransaction,
    pub wallet_balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct HistoryMeta {
    pub student_id: StudentId,
    pub wallet_balance: Decimal,
    pub count: usize,
}
