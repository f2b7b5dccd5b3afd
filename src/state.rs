use scholaris_config::{CorsConfig, JwtConfig};
use sqlx::PgPool;

use crate::modules::notifications::service::NotificationDispatcher;

/// Shared handles passed to every handler through axum `State`.
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub notifier: NotificationDispatcher,
}

/// Builds the state around an already opened pool and a running notifier.
pub fn init_app_state(db: PgPool, notifier: NotificationDispatcher) -> AppState {
    AppState {
        db,
        jwt_config: JwtConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        notifier,
    }
}
