use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use scholaris_models::students::WalletSummary;

use crate::validator::{validate_nfc_id, validate_non_negative_amount};

#[derive(Debug, Deserialize, Validate)]
pub struct AssignNfcDto {
    #[validate(custom(function = "validate_nfc_id"))]
    pub nfc_card_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NfcStatusDto {
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SpendingLimitDto {
    /// `null` removes the limit.
    #[validate(custom(function = "validate_non_negative_amount"))]
    pub daily_spending_limit: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct StudentWallet {
    #[serde(flatten)]
    pub summary: WalletSummary,
    pub spent_today: Decimal,
}
