use axum::http::{HeaderValue, Method};
use axum::{Router, middleware};
use tower_http::cors::CorsLayer;

use crate::logging::logging_middleware;
use crate::modules::finance::init_finance_router;
use crate::modules::health::init_health_router;
use crate::modules::notifications::init_notifications_router;
use crate::modules::pos::init_pos_router;
use crate::modules::students::init_students_router;
use crate::modules::wallet::init_wallet_router;
use crate::state::AppState;

pub fn init_router(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api",
            Router::new()
                .nest("/health", init_health_router())
                .nest(
                    "/finance",
                    init_finance_router(state.clone()).nest("/wallet", init_wallet_router()),
                )
                .nest("/pos", init_pos_router())
                .nest("/students", init_students_router())
                .nest("/notifications", init_notifications_router()),
        )
        .with_state(state.clone())
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                ])
                .allow_credentials(true)
        })
        .layer(middleware::from_fn(logging_middleware))
}
