use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use scholaris_core::PaginationParams;
use scholaris_core::serde::deserialize_optional_uuid;
use scholaris_models::{
    ids::{FeeStructureId, StudentId},
    invoices::{InvoiceStatus, Payment, PaymentMethod, ScopedInvoice},
};

use crate::validator::validate_positive_amount;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFeeStructureDto {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Decimal,
    #[validate(length(min = 4, max = 20))]
    pub academic_year: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct IssueInvoiceDto {
    pub student_id: StudentId,
    pub fee_structure_id: FeeStructureId,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordPaymentDto {
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Decimal,
    pub method: PaymentMethod,
    #[validate(length(max = 120))]
    pub reference: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub student_id: Option<Uuid>,
    pub status: Option<InvoiceStatus>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: ScopedInvoice,
    pub payments: Vec<Payment>,
}
