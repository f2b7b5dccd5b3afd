use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument, warn};

use scholaris_core::{AppError, PaginationMeta};
use scholaris_db::Filter;
use scholaris_models::{
    Identity,
    audit::AuditAction,
    ids::InvoiceId,
    invoices::{FeeStructure, Invoice, InvoiceStatus, Payment, ScopedInvoice},
};

use crate::modules::finance::model::{
    CreateFeeStructureDto, InvoiceDetail, InvoiceFilterParams, IssueInvoiceDto, RecordPaymentDto,
};
use crate::modules::students::service::StudentService;
use crate::utils::audit::{AuditEntry, log_audit};
use crate::utils::tenant::{check_tenant_entity, get_tenant, tenant_where};

const FEE_STRUCTURE_COLUMNS: &str = "id, school_id, name, amount, academic_year, created_at";
const INVOICE_COLUMNS: &str =
    "id, student_id, fee_structure_id, total_amount, amount_paid, status, due_date, created_at, updated_at";
const SCOPED_INVOICE_COLUMNS: &str = "id, student_id, fee_structure_id, total_amount, amount_paid, \
     status, due_date, created_at, updated_at, school_id, student_name";
const PAYMENT_COLUMNS: &str = "id, invoice_id, amount, method, reference, recorded_by, created_at";

const INVOICE_NOT_FOUND: &str = "Invoice not found.";

pub struct FinanceService;

impl FinanceService {
    #[instrument(skip(db, identity, dto), fields(db.operation = "INSERT", db.table = "fee_structures"))]
    pub async fn create_fee_structure(
        db: &PgPool,
        identity: &Identity,
        dto: CreateFeeStructureDto,
    ) -> Result<FeeStructure, AppError> {
        let school_id = get_tenant(identity).require_school()?;

        let fee = sqlx::query_as::<_, FeeStructure>(&format!(
            r#"INSERT INTO fee_structures (school_id, name, amount, academic_year)
               VALUES ($1, $2, $3, $4)
               RETURNING {FEE_STRUCTURE_COLUMNS}"#
        ))
        .bind(school_id)
        .bind(&dto.name)
        .bind(dto.amount)
        .bind(&dto.academic_year)
        .fetch_one(db)
        .await?;

        info!(fee_structure.id = %fee.id, school.id = %school_id, "Fee structure created");
        Ok(fee)
    }

    #[instrument(skip(db, identity), fields(db.operation = "SELECT", db.table = "fee_structures"))]
    pub async fn list_fee_structures(
        db: &PgPool,
        identity: &Identity,
    ) -> Result<Vec<FeeStructure>, AppError> {
        Ok(Self::find_fee_structures(db, &tenant_where(identity, Filter::new())).await?)
    }

    async fn find_fee_structures(db: &PgPool, filter: &Filter) -> Result<Vec<FeeStructure>, sqlx::Error> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {FEE_STRUCTURE_COLUMNS} FROM fee_structures"));
        filter.push_where(&mut qb);
        qb.push(" ORDER BY created_at DESC");
        qb.build_query_as::<FeeStructure>().fetch_all(db).await
    }

    /// Bills a student for a fee structure of the same school and raises the
    /// student's outstanding balance by the same amount.
    #[instrument(
        skip(db, identity, dto),
        fields(student.id = %dto.student_id, fee_structure.id = %dto.fee_structure_id)
    )]
    pub async fn issue_invoice(
        db: &PgPool,
        identity: &Identity,
        dto: IssueInvoiceDto,
    ) -> Result<Invoice, AppError> {
        let student_filter = tenant_where(identity, Filter::new().eq("id", dto.student_id));
        let fee_filter = tenant_where(identity, Filter::new().eq("id", dto.fee_structure_id));

        let (student, fees) = tokio::try_join!(
            StudentService::find_one(db, &student_filter),
            Self::find_fee_structures(db, &fee_filter),
        )?;

        let (student, fee) = match (student, fees.into_iter().next()) {
            (Some(student), Some(fee)) if student.school_id == fee.school_id => (student, fee),
            _ => {
                return Err(AppError::not_found(anyhow::anyhow!(
                    "Student or Fee Structure not found in your school."
                )));
            }
        };

        let mut tx = db.begin().await?;

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"INSERT INTO invoices (student_id, fee_structure_id, total_amount, status, due_date)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {INVOICE_COLUMNS}"#
        ))
        .bind(student.id)
        .bind(fee.id)
        .bind(fee.amount)
        .bind(InvoiceStatus::Issued)
        .bind(dto.due_date)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"UPDATE students
               SET total_fee = total_fee + $1, balance = balance + $1, updated_at = NOW()
               WHERE id = $2"#,
        )
        .bind(fee.amount)
        .bind(student.id)
        .execute(&mut *tx)
        .await?;

        log_audit(
            &mut tx,
            AuditEntry {
                actor: identity,
                action: AuditAction::IssueInvoice,
                details: json!({
                    "invoice_id": invoice.id,
                    "student_id": student.id,
                    "fee_structure_id": fee.id,
                    "amount": fee.amount,
                }),
                school_id: Some(student.school_id),
            },
        )
        .await?;

        tx.commit().await?;

        info!(invoice.id = %invoice.id, amount = %fee.amount, "Invoice issued");
        Ok(invoice)
    }

    #[instrument(skip(db, identity, params), fields(db.operation = "SELECT", db.table = "invoices_scoped"))]
    pub async fn list_invoices(
        db: &PgPool,
        identity: &Identity,
        params: &InvoiceFilterParams,
    ) -> Result<(Vec<ScopedInvoice>, PaginationMeta), AppError> {
        let mut extra = Filter::new();
        if let Some(student_id) = params.student_id {
            extra = extra.eq("student_id", student_id);
        }
        let filter = tenant_where(identity, extra);

        let mut count_qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM invoices_scoped");
        filter.push_where(&mut count_qb);
        if let Some(status) = params.status {
            count_qb.push(" AND status = ").push_bind(status);
        }
        let total = count_qb.build_query_scalar::<i64>().fetch_one(db).await?;

        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {SCOPED_INVOICE_COLUMNS} FROM invoices_scoped"));
        filter.push_where(&mut qb);
        if let Some(status) = params.status {
            qb.push(" AND status = ").push_bind(status);
        }
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(params.pagination.limit())
            .push(" OFFSET ")
            .push_bind(params.pagination.offset());

        let invoices = qb.build_query_as::<ScopedInvoice>().fetch_all(db).await?;

        Ok((invoices, PaginationMeta::new(total, &params.pagination)))
    }

    /// Invoice read through `invoices_scoped` by id only. Callers apply the
    /// tenant check to the returned `school_id`.
    async fn find_scoped_invoice(db: &PgPool, id: InvoiceId) -> Result<ScopedInvoice, AppError> {
        sqlx::query_as::<_, ScopedInvoice>(&format!(
            "SELECT {SCOPED_INVOICE_COLUMNS} FROM invoices_scoped WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!(INVOICE_NOT_FOUND)))
    }

    #[instrument(skip(db, identity), fields(invoice.id = %id))]
    pub async fn get_invoice(
        db: &PgPool,
        identity: &Identity,
        id: InvoiceId,
    ) -> Result<InvoiceDetail, AppError> {
        let invoice = Self::find_scoped_invoice(db, id).await?;
        check_tenant_entity(identity, invoice.school_id)?;

        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE invoice_id = $1 ORDER BY created_at"
        ))
        .bind(id)
        .fetch_all(db)
        .await?;

        Ok(InvoiceDetail { invoice, payments })
    }

    /// Records a payment against an invoice.
    ///
    /// The invoice row is locked for the whole unit, so concurrent payments on
    /// one invoice apply one after another and each sees the amount left by
    /// the previous one. The payment row, the student's paid/balance totals,
    /// the audit entry and the invoice status commit together.
    #[instrument(skip(db, identity, dto), fields(invoice.id = %invoice_id, amount = %dto.amount))]
    pub async fn record_payment(
        db: &PgPool,
        identity: &Identity,
        invoice_id: InvoiceId,
        dto: RecordPaymentDto,
    ) -> Result<Invoice, AppError> {
        let scoped = Self::find_scoped_invoice(db, invoice_id).await?;
        check_tenant_entity(identity, scoped.school_id)?;

        let mut tx = db.begin().await?;

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1 FOR UPDATE"
        ))
        .bind(invoice_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!(INVOICE_NOT_FOUND)))?;

        if invoice.status.is_closed() {
            warn!(status = %invoice.status, "Payment against closed invoice refused");
            return Err(AppError::conflict(anyhow::anyhow!(
                "Cannot record a payment against a {} invoice.",
                invoice.status
            )));
        }

        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"INSERT INTO payments (invoice_id, amount, method, reference, recorded_by)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {PAYMENT_COLUMNS}"#
        ))
        .bind(invoice.id)
        .bind(dto.amount)
        .bind(dto.method)
        .bind(&dto.reference)
        .bind(identity.id)
        .fetch_one(&mut *tx)
        .await?;

        let amount_paid = invoice.amount_paid + dto.amount;
        let status = invoice.status.after_payment(amount_paid, invoice.total_amount);

        sqlx::query(
            r#"UPDATE students
               SET paid = paid + $1, balance = balance - $1, updated_at = NOW()
               WHERE id = $2"#,
        )
        .bind(dto.amount)
        .bind(invoice.student_id)
        .execute(&mut *tx)
        .await?;

        log_audit(
            &mut tx,
            AuditEntry {
                actor: identity,
                action: AuditAction::RecordPayment,
                details: json!({
                    "invoice_id": invoice.id,
                    "payment_id": payment.id,
                    "amount": dto.amount,
                    "method": dto.method,
                    "status": status,
                }),
                school_id: Some(scoped.school_id),
            },
        )
        .await?;

        let updated = sqlx::query_as::<_, Invoice>(&format!(
            r#"UPDATE invoices
               SET amount_paid = amount_paid + $1, status = $2, updated_at = NOW()
               WHERE id = $3
               RETURNING {INVOICE_COLUMNS}"#
        ))
        .bind(dto.amount)
        .bind(status)
        .bind(invoice.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(payment.id = %payment.id, invoice.status = %updated.status, "Payment recorded");
        Ok(updated)
    }
}
