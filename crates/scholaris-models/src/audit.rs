//! Audit trail for money-moving actions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;

use crate::ids::{AuditLogId, SchoolId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    RecordPayment,
    IssueInvoice,
    WalletTopup,
    WalletAdjustment,
    PosOrder,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::RecordPayment => "RECORD_PAYMENT",
            AuditAction::IssueInvoice => "ISSUE_INVOICE",
            AuditAction::WalletTopup => "WALLET_TOPUP",
            AuditAction::WalletAdjustment => "WALLET_ADJUSTMENT",
            AuditAction::PosOrder => "POS_ORDER",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AuditLog {
    pub id: AuditLogId,
    pub user_id: Option<UserId>,
    pub user_email: Option<String>,
    pub action_type: String,
    pub details: sqlx::types::Json<Value>,
    pub school_id: Option<SchoolId>,
    pub created_at: DateTime<Utc>,
}
