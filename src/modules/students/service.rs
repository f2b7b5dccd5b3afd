use rust_decimal::Decimal;
use sqlx::{PgPool, QueryBuilder};
use tracing::{info, instrument};

use scholaris_core::{AppError, ErrorCode};
use scholaris_db::Filter;
use scholaris_models::{
    Identity, Role, Student,
    ids::StudentId,
    students::{STUDENT_COLUMNS, WalletSummary},
};

use crate::modules::students::model::StudentWallet;
use crate::modules::wallet::ledger::spent_today;
use crate::utils::tenant::{check_tenant_entity, tenant_where};

pub const STUDENT_NOT_FOUND: &str = "Student not found.";
pub const NOT_YOUR_CHILD: &str = "Access denied. Not your child.";

pub struct StudentService;

impl StudentService {
    /// First student matching `filter`. Callers pass a tenant-scoped filter.
    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "students"))]
    pub async fn find_one(db: &PgPool, filter: &Filter) -> Result<Option<Student>, sqlx::Error> {
        let mut qb = QueryBuilder::new(format!("SELECT {STUDENT_COLUMNS} FROM students"));
        filter.push_where(&mut qb);
        qb.push(" LIMIT 1");
        qb.build_query_as::<Student>().fetch_optional(db).await
    }

    /// Unscoped lookup by id, for reads that apply the tenant check afterwards.
    pub async fn find_by_id(db: &PgPool, id: StudentId) -> Result<Option<Student>, sqlx::Error> {
        Self::find_one(db, &Filter::new().eq("id", id)).await
    }

    /// Gate for reading a student's wallet: parents need to own the child,
    /// staff need the same school.
    pub fn authorize_wallet_read(identity: &Identity, student: &Student) -> Result<(), AppError> {
        match identity.role {
            Role::Parent if student.is_child_of(identity.id) => Ok(()),
            Role::Parent => Err(AppError::forbidden(NOT_YOUR_CHILD)),
            _ => check_tenant_entity(identity, student.school_id),
        }
    }

    /// Resolves a student the caller may manage: a parent's own child or, for
    /// staff, any student of their school.
    async fn find_manageable(
        db: &PgPool,
        identity: &Identity,
        id: StudentId,
    ) -> Result<Student, AppError> {
        let mut extra = Filter::new().eq("id", id);
        if identity.role == Role::Parent {
            extra = extra.eq("parent_id", identity.id);
        }

        let student = Self::find_one(db, &tenant_where(identity, extra))
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!(STUDENT_NOT_FOUND)))?;
        check_tenant_entity(identity, student.school_id)?;

        Ok(student)
    }

    #[instrument(skip(db, identity), fields(student.id = %id))]
    pub async fn get_wallet(
        db: &PgPool,
        identity: &Identity,
        id: StudentId,
    ) -> Result<StudentWallet, AppError> {
        let student = Self::find_by_id(db, id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!(STUDENT_NOT_FOUND)))?;
        Self::authorize_wallet_read(identity, &student)?;

        let mut conn = db.acquire().await?;
        let spent = spent_today(&mut *conn, student.id).await?;

        Ok(StudentWallet {
            summary: WalletSummary::from(&student),
            spent_today: spent,
        })
    }

    #[instrument(skip(db, identity))]
    pub async fn get_children(db: &PgPool, identity: &Identity) -> Result<Vec<WalletSummary>, AppError> {
        let filter = tenant_where(identity, Filter::new().eq("parent_id", identity.id));
        let mut qb = QueryBuilder::new(format!("SELECT {STUDENT_COLUMNS} FROM students"));
        filter.push_where(&mut qb);
        qb.push(" ORDER BY full_name");

        let students = qb.build_query_as::<Student>().fetch_all(db).await?;
        Ok(students.iter().map(WalletSummary::from).collect())
    }

    #[instrument(skip(db, identity), fields(db.operation = "UPDATE", db.table = "students"))]
    pub async fn assign_nfc(
        db: &PgPool,
        identity: &Identity,
        id: StudentId,
        nfc_card_id: String,
    ) -> Result<WalletSummary, AppError> {
        let student = Self::find_manageable(db, identity, id).await?;

        let updated = sqlx::query_as::<_, Student>(&format!(
            r#"UPDATE students
               SET nfc_card_id = $1, is_nfc_active = TRUE, updated_at = NOW()
               WHERE id = $2
               RETURNING {STUDENT_COLUMNS}"#
        ))
        .bind(&nfc_card_id)
        .bind(student.id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::msg(
                    ErrorCode::NfcConflict,
                    "This NFC card is already assigned to another student in your school.",
                );
            }
            AppError::from(e)
        })?;

        info!(student.id = %updated.id, "NFC card assigned");
        Ok(WalletSummary::from(&updated))
    }

    #[instrument(skip(db, identity), fields(db.operation = "UPDATE", db.table = "students"))]
    pub async fn set_nfc_status(
        db: &PgPool,
        identity: &Identity,
        id: StudentId,
        is_active: bool,
    ) -> Result<WalletSummary, AppError> {
        let student = Self::find_manageable(db, identity, id).await?;

        if is_active && student.nfc_card_id.is_none() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "No NFC card is assigned to this student."
            )));
        }

        let updated = sqlx::query_as::<_, Student>(&format!(
            r#"UPDATE students SET is_nfc_active = $1, updated_at = NOW()
               WHERE id = $2
               RETURNING {STUDENT_COLUMNS}"#
        ))
        .bind(is_active)
        .bind(student.id)
        .fetch_one(db)
        .await?;

        info!(student.id = %updated.id, is_active, "NFC card status changed");
        Ok(WalletSummary::from(&updated))
    }

    #[instrument(skip(db, identity), fields(db.operation = "UPDATE", db.table = "students"))]
    pub async fn set_spending_limit(
        db: &PgPool,
        identity: &Identity,
        id: StudentId,
        limit: Option<Decimal>,
    ) -> Result<WalletSummary, AppError> {
        let student = Self::find_manageable(db, identity, id).await?;

        let updated = sqlx::query_as::<_, Student>(&format!(
            r#"UPDATE students SET daily_spending_limit = $1, updated_at = NOW()
               WHERE id = $2
               RETURNING {STUDENT_COLUMNS}"#
        ))
        .bind(limit)
        .bind(student.id)
        .fetch_one(db)
        .await?;

        info!(student.id = %updated.id, limit = ?limit, "Daily spending limit changed");
        Ok(WalletSummary::from(&updated))
    }
}
