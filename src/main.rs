use std::time::Duration;

use dotenvy::dotenv;
use tracing::{error, info, warn};

use scholaris::logging::init_tracing;
use scholaris::modules::notifications::NotificationDispatcher;
use scholaris::router::init_router;
use scholaris::state::init_app_state;
use scholaris_config::{DatabaseConfig, NotificationConfig, ServerConfig};
use scholaris_db::{close_db_pool, init_db_pool};

const WORKER_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing()?;

    let db_config = DatabaseConfig::from_env().map_err(anyhow::Error::msg)?;
    let server_config = ServerConfig::from_env();
    let notification_config = NotificationConfig::from_env();

    let db = init_db_pool(&db_config).await?;
    let (notifier, worker) = NotificationDispatcher::spawn(db.clone(), &notification_config);

    let app = init_router(init_app_state(db.clone(), notifier));

    let address = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(%address, "🚀 Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, draining notification queue");
    match tokio::time::timeout(WORKER_DRAIN_TIMEOUT, worker).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "Notification worker panicked"),
        Err(_) => warn!("Notification worker did not finish in time"),
    }

    close_db_pool(&db).await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => error!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
