use axum::{
    Router,
    routing::{get, post, put},
};

use crate::modules::pos::controller::{
    create_item, create_order, delete_item, get_items, get_order, get_orders, update_item,
    verify_card,
};
use crate::state::AppState;

pub fn init_pos_router() -> Router<AppState> {
    Router::new()
        .route("/items", get(get_items).post(create_item))
        .route("/products", get(get_items))
        .route("/items/{id}", put(update_item).delete(delete_item))
        .route("/orders", post(create_order).get(get_orders))
        .route("/orders/{id}", get(get_order))
        .route("/verify-card/{nfc_id}", get(verify_card))
}
