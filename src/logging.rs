use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{Instrument, error, info, info_span, warn};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Logs every request and runs it inside a span carrying its request id, so
/// service-level events can be correlated with the request that caused them.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let matched_path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let request_id = uuid::Uuid::new_v4().to_string();
    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %matched_path,
    );

    let response = async move {
        info!("Incoming request");
        next.run(req).await
    }
    .instrument(span.clone())
    .await;

    let latency_ms = start.elapsed().as_millis();
    let status = response.status().as_u16();
    let _entered = span.enter();

    match status {
        400..=499 => warn!(status, latency_ms, "Client error"),
        500..=599 => error!(status, latency_ms, "Server error"),
        _ => info!(status, latency_ms, "Request completed"),
    }

    response
}

/// Installs the global subscriber: compact console output filtered by
/// `RUST_LOG`, a daily error log and a daily JSON log under `LOG_DIR`
/// (default `storage/logs`).
///
/// # Errors
///
/// Fails when the log directory cannot be created.
pub fn init_tracing() -> std::io::Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::fmt;

    let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "storage/logs".to_string());
    std::fs::create_dir_all(&log_dir)?;

    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}=info,tower_http=warn,sqlx=warn,axum::rejection=trace",
            env!("CARGO_CRATE_NAME")
        ))
    });

    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .with_filter(console_filter);

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "scholaris.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_filter(EnvFilter::new("error"));

    let json_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "scholaris.json");
    let json_layer = fmt::layer()
        .json()
        .with_writer(json_appender)
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(json_layer)
        .init();

    Ok(())
}
