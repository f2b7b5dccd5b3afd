//! Application error type and its HTTP rendering.
//!
//! Every handler returns `Result<_, AppError>`. An [`AppError`] carries the
//! HTTP status, a machine-readable [`ErrorCode`], the underlying
//! [`anyhow::Error`] and optional structured details. It renders as the
//! failure envelope:
//!
//! ```json
//! { "success": false, "error": { "message": "...", "code": "NOT_FOUND" } }
//! ```
//!
//! Server-side faults are logged with their full context and rendered with a
//! generic message so storage internals never reach the client.

use std::fmt;

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::error;

const SERVER_ERROR_MESSAGE: &str = "Internal server error";

/// Machine-readable error codes carried in the failure envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    Unauthorized,
    Forbidden,
    ForbiddenRole,
    TenantForbidden,
    NotFound,
    Conflict,
    DuplicateItem,
    NfcConflict,
    CardFrozen,
    InsufficientBalance,
    DailyLimitExceeded,
    ServerError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::ForbiddenRole => "FORBIDDEN_ROLE",
            ErrorCode::TenantForbidden => "TENANT_FORBIDDEN",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::DuplicateItem => "DUPLICATE_ITEM",
            ErrorCode::NfcConflict => "NFC_CONFLICT",
            ErrorCode::CardFrozen => "CARD_FROZEN",
            ErrorCode::InsufficientBalance => "INSUFFICIENT_BALANCE",
            ErrorCode::DailyLimitExceeded => "DAILY_LIMIT_EXCEEDED",
            ErrorCode::ServerError => "SERVER_ERROR",
        }
    }

    /// Default HTTP status for the code.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden
            | ErrorCode::ForbiddenRole
            | ErrorCode::TenantForbidden
            | ErrorCode::CardFrozen
            | ErrorCode::DailyLimitExceeded => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict | ErrorCode::DuplicateItem | ErrorCode::NfcConflict => {
                StatusCode::CONFLICT
            }
            ErrorCode::InsufficientBalance => StatusCode::PAYMENT_REQUIRED,
            ErrorCode::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub error: Error,
    pub details: Option<Value>,
}

impl AppError {
    pub fn new<E>(code: ErrorCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status: code.status(),
            code,
            error: err.into(),
            details: None,
        }
    }

    /// Builds an error from a plain message.
    pub fn msg(code: ErrorCode, message: impl fmt::Display) -> Self {
        Self::new(code, anyhow::anyhow!("{}", message))
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorCode::ServerError, err)
    }

    pub fn database<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorCode::ServerError, err)
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorCode::NotFound, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorCode::ValidationError, err)
    }

    pub fn conflict<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorCode::Conflict, err)
    }

    pub fn unauthorized(message: impl fmt::Display) -> Self {
        Self::msg(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl fmt::Display) -> Self {
        Self::msg(ErrorCode::Forbidden, message)
    }

    pub fn forbidden_role(message: impl fmt::Display) -> Self {
        Self::msg(ErrorCode::ForbiddenRole, message)
    }

    /// Converts validator output into a 400 with per-field details.
    pub fn validation(errors: &validator::ValidationErrors) -> Self {
        let details: serde_json::Map<String, Value> = errors
            .field_errors()
            .iter()
            .map(|(field, errs)| {
                let messages: Vec<String> = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("{} is invalid", field))
                    })
                    .collect();
                (field.to_string(), json!(messages))
            })
            .collect();

        Self::msg(ErrorCode::ValidationError, "Validation failed").with_details(Value::Object(details))
    }

    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.status.as_u16(), self.error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = if self.is_server_error() {
            error!(
                error = ?self.error,
                code = %self.code,
                status = %self.status.as_u16(),
                "Unhandled server error"
            );
            SERVER_ERROR_MESSAGE.to_string()
        } else {
            self.error.to_string()
        };

        let mut body = json!({
            "message": message,
            "code": self.code,
        });
        if let Some(details) = self.details
            && !self.status.is_server_error()
        {
            body["details"] = details;
        }

        (
            self.status,
            Json(json!({
                "success": false,
                "error": body,
            })),
        )
            .into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.is_foreign_key_violation()
        {
            return AppError::msg(
                ErrorCode::ValidationError,
                "Referenced record does not exist",
            );
        }
        AppError::database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::validation(&errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_code_statuses() {
        assert_eq!(ErrorCode::InsufficientBalance.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(ErrorCode::DailyLimitExceeded.status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::TenantForbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::NfcConflict.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::DuplicateItem.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::ValidationError.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_code_serializes_screaming_snake() {
        let v = serde_json::to_value(ErrorCode::DailyLimitExceeded).unwrap();
        assert_eq!(v, "DAILY_LIMIT_EXCEEDED");
        assert_eq!(ErrorCode::TenantForbidden.to_string(), "TENANT_FORBIDDEN");
    }

    #[tokio::test]
    async fn test_failure_envelope() {
        let (status, body) = body_json(AppError::not_found(anyhow::anyhow!("Invoice not found"))).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["message"], "Invoice not found");
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert!(body["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn test_server_error_hides_internals() {
        let err = AppError::internal(anyhow::anyhow!("relation \"students\" does not exist"));
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "SERVER_ERROR");
        assert_eq!(body["error"]["message"], SERVER_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_details_are_rendered() {
        let err = AppError::msg(ErrorCode::ValidationError, "Validation failed")
            .with_details(json!({"amount": ["must be positive"]}));
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"]["amount"][0], "must be positive");
    }

    #[test]
    fn test_row_not_found_is_server_error() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.code, ErrorCode::ServerError);
        assert!(err.is_server_error());
    }
}
