use axum::{
    Router,
    routing::{get, post},
};

use crate::modules::wallet::controller::{adjust_wallet, get_wallet_history, top_up_wallet};
use crate::state::AppState;

pub fn init_wallet_router() -> Router<AppState> {
    Router::new()
        .route("/topup", post(top_up_wallet))
        .route("/adjustments", post(adjust_wallet))
        .route("/{student_id}/history", get(get_wallet_history))
}
