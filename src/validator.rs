use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request, rejection::JsonRejection},
    http::request::Parts,
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use scholaris_core::AppError;

/// JSON body extractor that runs `validator` rules after deserializing.
///
/// Malformed bodies and rule violations both become 400 `VALIDATION_ERROR`;
/// rule violations carry per-field messages under `details`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
        return AppError::bad_request(anyhow!(
            "Missing 'Content-Type: application/json' header"
        ));
    }

    let error_msg = rejection.body_text();

    if let Some(field) = error_msg
        .split("missing field `")
        .nth(1)
        .and_then(|s| s.split('`').next())
    {
        return AppError::bad_request(anyhow!("{} is required", field));
    }

    if error_msg.contains("invalid type") || error_msg.contains("unknown variant") {
        return AppError::bad_request(anyhow!("Invalid field value in request"));
    }

    AppError::bad_request(anyhow!("Invalid request body"))
}

/// Query-string extractor with the same validation behavior as [`ValidatedJson`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::bad_request(anyhow!("{}", rejection.body_text())))?;

        value.validate()?;

        Ok(ValidatedQuery(value))
    }
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

/// Money amounts: strictly positive with at most two decimal places.
pub fn validate_positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(invalid("positive", "amount must be greater than zero"));
    }
    if value.normalize().scale() > 2 {
        return Err(invalid("precision", "amount must have at most two decimal places"));
    }
    Ok(())
}

/// Wallet top-ups: 0.01 to 100000.
pub fn validate_topup_amount(value: &Decimal) -> Result<(), ValidationError> {
    validate_positive_amount(value)?;
    if *value > Decimal::from(100_000) {
        return Err(invalid("max", "amount must not exceed 100000"));
    }
    Ok(())
}

/// Signed wallet corrections: non-zero, at most two decimals, magnitude up to 100000.
pub fn validate_signed_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_zero() {
        return Err(invalid("non_zero", "amount must not be zero"));
    }
    if value.normalize().scale() > 2 {
        return Err(invalid("precision", "amount must have at most two decimal places"));
    }
    if value.abs() > Decimal::from(100_000) {
        return Err(invalid("max", "amount must not exceed 100000 in either direction"));
    }
    Ok(())
}

pub fn validate_non_negative_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(invalid("non_negative", "amount must not be negative"));
    }
    Ok(())
}

/// NFC card ids: 4 to 64 characters of `[A-Za-z0-9_-]`.
pub fn validate_nfc_id(value: &str) -> Result<(), ValidationError> {
    let valid_len = (4..=64).contains(&value.len());
    let valid_chars = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid_len && valid_chars {
        Ok(())
    } else {
        Err(invalid(
            "nfc_id",
            "NFC id must be 4-64 characters of letters, digits, '-' or '_'",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_positive_amount() {
        assert!(validate_positive_amount(&dec("0.01")).is_ok());
        assert!(validate_positive_amount(&dec("12.50")).is_ok());
        assert!(validate_positive_amount(&dec("0")).is_err());
        assert!(validate_positive_amount(&dec("-5")).is_err());
        assert!(validate_positive_amount(&dec("1.005")).is_err());
    }

    #[test]
    fn test_topup_upper_bound() {
        assert!(validate_topup_amount(&dec("100000")).is_ok());
        assert!(validate_topup_amount(&dec("100000.01")).is_err());
    }

    #[test]
    fn test_signed_amount() {
        assert!(validate_signed_amount(&dec("-4.50")).is_ok());
        assert!(validate_signed_amount(&dec("2.5")).is_ok());
        assert!(validate_signed_amount(&dec("-100000")).is_ok());
        assert!(validate_signed_amount(&dec("0")).is_err());
        assert!(validate_signed_amount(&dec("-0.005")).is_err());
        assert!(validate_signed_amount(&dec("0.004")).is_err());
        assert!(validate_signed_amount(&dec("100000.01")).is_err());
    }

    #[test]
    fn test_nfc_id_rules() {
        assert!(validate_nfc_id("04A2-9F_11").is_ok());
        assert!(validate_nfc_id("abc").is_err());
        assert!(validate_nfc_id("card id").is_err());
        assert!(validate_nfc_id(&"x".repeat(65)).is_err());
    }
}
