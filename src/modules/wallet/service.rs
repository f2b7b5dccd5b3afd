use rust_decimal::Decimal;
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument};

use scholaris_core::{AppError, ErrorCode};
use scholaris_db::Filter;
use scholaris_models::{
    Identity, Role, Student, WalletTransaction, WalletTxnType, audit::AuditAction,
    ids::StudentId,
};

use crate::modules::students::service::{STUDENT_NOT_FOUND, StudentService};
use crate::modules::wallet::ledger::{LedgerEntry, process_transaction};
use crate::modules::wallet::model::{AdjustmentDto, AdjustmentKind, HistoryQuery, TopUpDto, WalletChange};
use crate::utils::audit::{AuditEntry, log_audit};
use crate::utils::tenant::tenant_where;

pub struct WalletService;

impl WalletService {
    /// Credits a student's wallet. Parents may only fund their own children;
    /// school admins any student of their school.
    #[instrument(skip(db, identity, dto), fields(student.id = %dto.student_id, amount = %dto.amount))]
    pub async fn top_up(
        db: &PgPool,
        identity: &Identity,
        dto: TopUpDto,
    ) -> Result<WalletChange, AppError> {
        let mut extra = Filter::new().eq("id", dto.student_id);
        if identity.role == Role::Parent {
            extra = extra.eq("parent_id", identity.id);
        }

        let student = StudentService::find_one(db, &tenant_where(identity, extra))
            .await?
            .ok_or_else(|| {
                AppError::msg(
                    ErrorCode::TenantForbidden,
                    "Forbidden: You are not the parent of this student or student not in your school scope.",
                )
            })?;

        let mut tx = db.begin().await?;

        let outcome = process_transaction(
            &mut tx,
            LedgerEntry {
                student_id: student.id,
                school_id: student.school_id,
                amount: dto.amount,
                txn_type: WalletTxnType::Topup,
                description: Some(format!("Wallet top-up by {}", identity.role)),
                created_by: Some(identity.id),
            },
        )
        .await?;

        log_audit(
            &mut tx,
            AuditEntry {
                actor: identity,
                action: AuditAction::WalletTopup,
                details: json!({
                    "student_id": student.id,
                    "amount": dto.amount,
                    "transaction_id": outcome.transaction.id,
                    "new_balance": outcome.student.wallet_balance,
                }),
                school_id: Some(student.school_id),
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            txn.id = %outcome.transaction.id,
            wallet.balance = %outcome.student.wallet_balance,
            "Wallet topped up"
        );

        Ok(WalletChange {
            wallet_balance: outcome.student.wallet_balance,
            transaction: outcome.transaction,
        })
    }

    #[instrument(skip(db, identity, dto), fields(student.id = %dto.student_id, amount = %dto.amount))]
    pub async fn adjust(
        db: &PgPool,
        identity: &Identity,
        dto: AdjustmentDto,
    ) -> Result<WalletChange, AppError> {
        if dto.amount.is_zero() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Adjustment amount must not be zero."
            )));
        }
        if dto.kind == AdjustmentKind::Refund && dto.amount < Decimal::ZERO {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Refund amount must be positive."
            )));
        }

        let student = StudentService::find_one(
            db,
            &tenant_where(identity, Filter::new().eq("id", dto.student_id)),
        )
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!(STUDENT_NOT_FOUND)))?;

        let txn_type = WalletTxnType::from(dto.kind);
        let mut tx = db.begin().await?;

        let outcome = process_transaction(
            &mut tx,
            LedgerEntry {
                student_id: student.id,
                school_id: student.school_id,
                amount: dto.amount,
                txn_type,
                description: dto.description.clone(),
                created_by: Some(identity.id),
            },
        )
        .await?;

        log_audit(
            &mut tx,
            AuditEntry {
                actor: identity,
                action: AuditAction::WalletAdjustment,
                details: json!({
                    "student_id": student.id,
                    "amount": dto.amount,
                    "type": txn_type,
                    "transaction_id": outcome.transaction.id,
                }),
                school_id: Some(student.school_id),
            },
        )
        .await?;

        tx.commit().await?;

        info!(txn.id = %outcome.transaction.id, "Wallet adjusted");

        Ok(WalletChange {
            wallet_balance: outcome.student.wallet_balance,
            transaction: outcome.transaction,
        })
    }

    /// Ledger rows for a student, newest first, with the student row they
    /// belong to.
    #[instrument(skip(db, identity, query), fields(student.id = %student_id))]
    pub async fn history(
        db: &PgPool,
        identity: &Identity,
        student_id: StudentId,
        query: &HistoryQuery,
    ) -> Result<(Student, Vec<WalletTransaction>), AppError> {
        let student = StudentService::find_by_id(db, student_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!(STUDENT_NOT_FOUND)))?;

        StudentService::authorize_wallet_read(identity, &student)?;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, student_id, school_id, amount, txn_type, description, created_by, created_at \
             FROM wallet_transactions WHERE student_id = ",
        );
        qb.push_bind(student.id);

        if let Some(txn_type) = query.txn_type {
            qb.push(" AND txn_type = ").push_bind(txn_type);
        }
        if let Some(from) = query.from {
            qb.push(" AND created_at >= ").push_bind(from);
        }
        if let Some(to) = query.to {
            qb.push(" AND created_at <= ").push_bind(to);
        }

        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(query.limit());

        let transactions = qb
            .build_query_as::<WalletTransaction>()
            .fetch_all(db)
            .await?;

        Ok((student, transactions))
    }
}
