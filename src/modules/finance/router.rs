use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::role::require_finance_staff;
use crate::modules::finance::controller::{
    create_fee_structure, get_fee_structures, get_invoice, get_invoices, issue_invoice,
    record_payment,
};
use crate::state::AppState;

pub fn init_finance_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/fee-structures", post(create_fee_structure).get(get_fee_structures))
        .route("/invoices", post(issue_invoice).get(get_invoices))
        .route("/invoices/{id}", get(get_invoice))
        .route("/invoices/{id}/payments", post(record_payment))
        .route_layer(middleware::from_fn_with_state(state, require_finance_staff))
}
