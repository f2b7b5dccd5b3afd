//! # Scholaris DB
//!
//! Database pool lifecycle and query-filter building for the Scholaris API.
//!
//! - [`init_db_pool`] opens the pool once at startup; the pool is handed to the
//!   application state and closed explicitly on shutdown.
//! - [`filter`] holds [`Filter`], the ordered set of column conditions produced
//!   by tenant scoping and rendered into SQL through [`sqlx::QueryBuilder`].
//!
//! # Example
//!
//! ```ignore
//! use scholaris_config::DatabaseConfig;
//! use scholaris_db::{Filter, init_db_pool};
//!
//! let pool = init_db_pool(&DatabaseConfig::from_env()?).await?;
//!
//! let filter = Filter::new().eq("id", student_id).eq("school_id", school_id);
//! let mut qb = sqlx::QueryBuilder::new("SELECT * FROM students");
//! filter.push_where(&mut qb);
//! let student = qb.build_query_as::<Student>().fetch_optional(&pool).await?;
//! ```

pub mod filter;

use std::time::Duration;

use scholaris_config::DatabaseConfig;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

pub use filter::{Filter, FilterValue};
pub use sqlx::PgPool;

/// Opens the PostgreSQL connection pool described by `config`.
///
/// # Errors
///
/// Returns the underlying [`sqlx::Error`] when the first connection cannot be
/// established.
pub async fn init_db_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url)
        .await?;

    info!(
        max_connections = config.max_connections,
        "Database pool initialized"
    );

    Ok(pool)
}

/// Closes the pool, waiting for checked-out connections to be returned.
pub async fn close_db_pool(pool: &PgPool) {
    pool.close().await;
    info!("Database pool closed");
}
