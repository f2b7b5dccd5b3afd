use axum::{
    Router,
    routing::{get, patch, put},
};

use crate::modules::students::controller::{
    assign_nfc, get_my_children, get_student_wallet, set_nfc_status, set_spending_limit,
};
use crate::state::AppState;

pub fn init_students_router() -> Router<AppState> {
    Router::new()
        .route("/my-children", get(get_my_children))
        .route("/{id}/wallet", get(get_student_wallet))
        .route("/{id}/nfc", patch(assign_nfc))
        .route("/{id}/nfc/status", patch(set_nfc_status))
        .route("/{id}/spending-limit", put(set_spending_limit))
}
