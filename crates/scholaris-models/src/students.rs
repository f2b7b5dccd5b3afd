//! Students and their wallet state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use crate::ids::{SchoolId, StudentId, UserId};

/// Column list matching [`Student`], for hand-written selects.
pub const STUDENT_COLUMNS: &str = "id, school_id, parent_id, full_name, grade, wallet_balance, \
     daily_spending_limit, nfc_card_id, is_nfc_active, total_fee, paid, balance, created_at, \
     updated_at";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Student {
    pub id: StudentId,
    pub school_id: SchoolId,
    pub parent_id: Option<UserId>,
    pub full_name: String,
    pub grade: Option<String>,
    /// Never negative; enforced by the ledger engine and a table CHECK.
    pub wallet_balance: Decimal,
    /// `None` means unlimited.
    pub daily_spending_limit: Option<Decimal>,
    pub nfc_card_id: Option<String>,
    pub is_nfc_active: bool,
    pub total_fee: Decimal,
    pub paid: Decimal,
    /// Mirrors `total_fee - paid`.
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub fn is_child_of(&self, user_id: UserId) -> bool {
        self.parent_id == Some(user_id)
    }
}

/// Wallet summary returned to parents and staff.
#[derive(Debug, Clone, Serialize)]
pub struct WalletSummary {
    pub student_id: StudentId,
    pub full_name: String,
    pub wallet_balance: Decimal,
    pub daily_spending_limit: Option<Decimal>,
    pub has_card: bool,
    pub is_nfc_active: bool,
}

impl From<&Student> for WalletSummary {
    fn from(student: &Student) -> Self {
        Self {
            student_id: student.id,
            full_name: student.full_name.clone(),
            wallet_balance: student.wallet_balance,
            daily_spending_limit: student.daily_spending_limit,
            has_card: student.nfc_card_id.is_some(),
            is_nfc_active: student.is_nfc_active,
        }
    }
}
