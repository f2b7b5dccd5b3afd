use axum::{Router, extract::State, routing::get};
use serde::Serialize;
use tracing::warn;

use scholaris_core::ApiResponse;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: &'static str,
}

pub async fn check_health(State(state): State<AppState>) -> ApiResponse<HealthStatus> {
    let database = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "up",
        Err(e) => {
            warn!(error = %e, "Health check could not reach the database");
            "down"
        }
    };

    ApiResponse::ok(HealthStatus {
        status: if database == "up" { "ok" } else { "degraded" },
        database,
    })
}

pub fn init_health_router() -> Router<AppState> {
    Router::new().route("/", get(check_health))
}
