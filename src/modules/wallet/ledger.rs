//! The wallet ledger engine.
//!
//! [`process_transaction`] is the only code path that changes a student's
//! `wallet_balance`. It runs on a caller-supplied connection, normally an open
//! transaction, so the balance change, the ledger row and whatever the caller
//! writes next (an order, an audit entry) commit or roll back together.
//!
//! Within one call:
//!
//! 1. the student row is locked (`FOR UPDATE`), scoped to the given school
//! 2. debits that would overdraw the wallet are refused
//! 3. debits are checked against the daily spending limit, counting only
//!    `purchase` rows created during the current local calendar day
//! 4. the balance is updated with a guarded `UPDATE` that cannot go negative
//! 5. one ledger row is appended
//!
//! Concurrent debits on the same student serialize on the row lock, so each
//! sees the balance left by the previous one.

use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use scholaris_models::{
    Student, WalletTransaction, WalletTxnType,
    ids::{SchoolId, StudentId, UserId},
    students::STUDENT_COLUMNS,
};
use sqlx::PgConnection;
use tracing::{debug, info, instrument, warn};

use scholaris_core::{AppError, ErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Student not found or does not belong to the school")]
    StudentNotFound,
    #[error("Transaction amount must not be zero")]
    ZeroAmount,
    #[error("Transaction amount must have at most two decimal places")]
    InvalidPrecision,
    #[error("Insufficient wallet balance")]
    InsufficientBalance,
    #[error("Daily spending limit of {limit} exceeded.")]
    DailyLimitExceeded { limit: Decimal },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::StudentNotFound => AppError::msg(ErrorCode::NotFound, err),
            LedgerError::ZeroAmount | LedgerError::InvalidPrecision => {
                AppError::msg(ErrorCode::ValidationError, err)
            }
            LedgerError::InsufficientBalance => AppError::msg(ErrorCode::InsufficientBalance, err),
            LedgerError::DailyLimitExceeded { .. } => {
                AppError::msg(ErrorCode::DailyLimitExceeded, err)
            }
            LedgerError::Database(db_err) => AppError::from(db_err),
        }
    }
}

/// A requested balance change. Positive amounts credit, negative amounts debit.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub student_id: StudentId,
    pub school_id: SchoolId,
    pub amount: Decimal,
    pub txn_type: WalletTxnType,
    pub description: Option<String>,
    pub created_by: Option<UserId>,
}

#[derive(Debug, Clone)]
pub struct LedgerOutcome {
    /// The student row after the balance change.
    pub student: Student,
    pub transaction: WalletTransaction,
}

#[instrument(
    skip(conn, entry),
    fields(
        student.id = %entry.student_id,
        txn.kind = %entry.txn_type,
        txn.amount = %entry.amount,
        db.table = "wallet_transactions"
    )
)]
pub async fn process_transaction(
    conn: &mut PgConnection,
    entry: LedgerEntry,
) -> Result<LedgerOutcome, LedgerError> {
    check_amount(entry.amount)?;

    let student = sqlx::query_as::<_, Student>(&format!(
        "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1 AND school_id = $2 FOR UPDATE"
    ))
    .bind(entry.student_id)
    .bind(entry.school_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(LedgerError::StudentNotFound)?;

    check_overdraft(student.wallet_balance, entry.amount)?;

    if entry.amount.is_sign_negative()
        && let Some(limit) = student.daily_spending_limit
    {
        let spent = spent_today(conn, student.id).await?;
        debug!(%spent, %limit, "Checking daily spending limit");
        check_daily_limit(spent, entry.amount, limit)?;
    }

    let student = sqlx::query_as::<_, Student>(&format!(
        r#"UPDATE students
           SET wallet_balance = wallet_balance + $1, updated_at = NOW()
           WHERE id = $2 AND school_id = $3 AND wallet_balance + $1 >= 0
           RETURNING {STUDENT_COLUMNS}"#
    ))
    .bind(entry.amount)
    .bind(entry.student_id)
    .bind(entry.school_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| {
        warn!("Guarded balance update matched no row");
        LedgerError::InsufficientBalance
    })?;

    let description = entry
        .description
        .unwrap_or_else(|| format!("Transaction: {}", entry.txn_type));

    let transaction = sqlx::query_as::<_, WalletTransaction>(
        r#"INSERT INTO wallet_transactions
               (student_id, school_id, amount, txn_type, description, created_by)
           VALUES ($1, $2, $3, $4, $5, $6)
           RETURNING id, student_id, school_id, amount, txn_type, description, created_by, created_at"#,
    )
    .bind(entry.student_id)
    .bind(entry.school_id)
    .bind(entry.amount)
    .bind(entry.txn_type)
    .bind(&description)
    .bind(entry.created_by)
    .fetch_one(&mut *conn)
    .await?;

    info!(
        txn.id = %transaction.id,
        wallet.balance = %student.wallet_balance,
        "Wallet transaction recorded"
    );

    Ok(LedgerOutcome {
        student,
        transaction,
    })
}

/// Sum of today's purchases for a student, as a positive amount.
pub async fn spent_today(conn: &mut PgConnection, student_id: StudentId) -> Result<Decimal, sqlx::Error> {
    let (start, end) = day_bounds(&Local::now());

    sqlx::query_scalar::<_, Decimal>(
        r#"SELECT COALESCE(SUM(ABS(amount)), 0)
           FROM wallet_transactions
           WHERE student_id = $1 AND txn_type = $2 AND created_at >= $3 AND created_at <= $4"#,
    )
    .bind(student_id)
    .bind(WalletTxnType::Purchase)
    .bind(start)
    .bind(end)
    .fetch_one(&mut *conn)
    .await
}

/// Amounts are stored as NUMERIC(12,2); anything finer would be rounded
/// differently in the ledger row and in the balance.
pub fn check_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount.is_zero() {
        return Err(LedgerError::ZeroAmount);
    }
    if amount.normalize().scale() > 2 {
        return Err(LedgerError::InvalidPrecision);
    }
    Ok(())
}

pub fn check_overdraft(balance: Decimal, amount: Decimal) -> Result<(), LedgerError> {
    if amount.is_sign_negative() && balance + amount < Decimal::ZERO {
        return Err(LedgerError::InsufficientBalance);
    }
    Ok(())
}

/// A debit may bring today's spend up to the limit, not past it.
pub fn check_daily_limit(spent_today: Decimal, amount: Decimal, limit: Decimal) -> Result<(), LedgerError> {
    if amount.is_sign_negative() && spent_today + amount.abs() > limit {
        return Err(LedgerError::DailyLimitExceeded { limit });
    }
    Ok(())
}

/// First and last millisecond of the calendar day containing `now`, in the
/// timezone of `now`, expressed in UTC.
pub fn day_bounds<Tz: TimeZone>(now: &DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
    let tz = now.timezone();
    let date = now.date_naive();
    let fallback = now.with_timezone(&Utc);

    let start = tz
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .map_or(fallback, |dt| dt.with_timezone(&Utc));
    let end = date
        .and_hms_milli_opt(23, 59, 59, 999)
        .and_then(|t| tz.from_local_datetime(&t).latest())
        .map_or(fallback, |dt| dt.with_timezone(&Utc));

    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_sub_cent_amounts_refused() {
        assert!(matches!(check_amount(d("-0.005")), Err(LedgerError::InvalidPrecision)));
        assert!(matches!(check_amount(d("0.004")), Err(LedgerError::InvalidPrecision)));
        assert!(matches!(check_amount(d("0.00")), Err(LedgerError::ZeroAmount)));
        assert!(check_amount(d("-4.50")).is_ok());
        assert!(check_amount(d("1.500")).is_ok());
    }

    #[test]
    fn test_overdraft_refused() {
        assert!(matches!(
            check_overdraft(d("20.00"), d("-30.00")),
            Err(LedgerError::InsufficientBalance)
        ));
    }

    #[test]
    fn test_debit_to_exactly_zero_allowed() {
        assert!(check_overdraft(d("20.00"), d("-20.00")).is_ok());
    }

    #[test]
    fn test_credits_skip_overdraft_check() {
        assert!(check_overdraft(Decimal::ZERO, d("5.00")).is_ok());
    }

    #[test]
    fn test_daily_limit_exceeded() {
        let err = check_daily_limit(Decimal::ZERO, d("-15.00"), d("10.00")).unwrap_err();
        assert_eq!(err.to_string(), "Daily spending limit of 10.00 exceeded.");
    }

    #[test]
    fn test_daily_limit_counts_prior_spend() {
        assert!(check_daily_limit(d("6.00"), d("-4.00"), d("10.00")).is_ok());
        assert!(check_daily_limit(d("6.00"), d("-4.01"), d("10.00")).is_err());
    }

    #[test]
    fn test_daily_limit_ignores_credits() {
        assert!(check_daily_limit(d("50.00"), d("20.00"), d("10.00")).is_ok());
    }

    #[test]
    fn test_day_bounds_follow_local_calendar_day() {
        let amman = FixedOffset::east_opt(3 * 3600).unwrap();
        let now = amman.with_ymd_and_hms(2025, 3, 10, 1, 30, 0).unwrap();

        let (start, end) = day_bounds(&now);

        assert_eq!(start.to_rfc3339(), "2025-03-09T21:00:00+00:00");
        assert_eq!(
            end.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            "2025-03-10T20:59:59.999Z"
        );
    }

    #[test]
    fn test_ledger_errors_map_to_codes() {
        let insufficient = AppError::from(LedgerError::InsufficientBalance);
        assert_eq!(insufficient.code, ErrorCode::InsufficientBalance);
        assert_eq!(insufficient.status.as_u16(), 402);

        let limit = AppError::from(LedgerError::DailyLimitExceeded { limit: d("10.00") });
        assert_eq!(limit.code, ErrorCode::DailyLimitExceeded);
        assert_eq!(limit.status.as_u16(), 403);

        let precision = AppError::from(LedgerError::InvalidPrecision);
        assert_eq!(precision.code, ErrorCode::ValidationError);
        assert_eq!(precision.status.as_u16(), 400);

        let missing = AppError::from(LedgerError::StudentNotFound);
        assert_eq!(missing.code, ErrorCode::NotFound);
    }
}
