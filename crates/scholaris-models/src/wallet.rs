//! The append-only wallet ledger.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::ids::{SchoolId, StudentId, UserId, WalletTxnId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "wallet_txn_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WalletTxnType {
    Topup,
    Purchase,
    Refund,
    Adjustment,
}

impl WalletTxnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletTxnType::Topup => "topup",
            WalletTxnType::Purchase => "purchase",
            WalletTxnType::Refund => "refund",
            WalletTxnType::Adjustment => "adjustment",
        }
    }

    /// Only purchases count toward the daily spending limit.
    pub fn counts_as_spend(&self) -> bool {
        matches!(self, WalletTxnType::Purchase)
    }
}

impl fmt::Display for WalletTxnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable ledger row. `amount` is signed: credits are positive,
/// debits negative.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WalletTransaction {
    pub id: WalletTxnId,
    pub student_id: StudentId,
    pub school_id: SchoolId,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub txn_type: WalletTxnType,
    pub description: String,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}
