//! Fee structures, invoices and payments.
//!
//! Invoices do not carry a school id of their own; the owning school is the
//! school of the invoiced student. The `invoices_scoped` view exposes it as a
//! `school_id` column so invoice reads can be tenant-filtered like any other
//! table.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::ids::{FeeStructureId, InvoiceId, PaymentId, SchoolId, StudentId, UserId};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FeeStructure {
    pub id: FeeStructureId,
    pub school_id: SchoolId,
    pub name: String,
    pub amount: Decimal,
    pub academic_year: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invoice_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Issued,
    Partial,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Issued => "issued",
            InvoiceStatus::Partial => "partial",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    /// Paid and cancelled invoices accept no further payments.
    pub fn is_closed(&self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }

    /// Status after the paid amount reaches `amount_paid`.
    ///
    /// `paid` once the total is covered, `partial` while something has been
    /// paid, otherwise unchanged.
    pub fn after_payment(self, amount_paid: Decimal, total_amount: Decimal) -> InvoiceStatus {
        if amount_paid >= total_amount {
            InvoiceStatus::Paid
        } else if amount_paid > Decimal::ZERO {
            InvoiceStatus::Partial
        } else {
            self
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Invoice {
    pub id: InvoiceId,
    pub student_id: StudentId,
    pub fee_structure_id: FeeStructureId,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub status: InvoiceStatus,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An invoice row read through `invoices_scoped`, carrying the student's school.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ScopedInvoice {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub invoice: Invoice,
    pub school_id: SchoolId,
    pub student_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Cash,
    BankTransfer,
    Cliq,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Payment {
    pub id: PaymentId,
    pub invoice_id: InvoiceId,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub recorded_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}
