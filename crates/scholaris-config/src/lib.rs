//! # Scholaris Config
//!
//! Configuration structures loaded from environment variables (a `.env` file
//! is read by the binaries through `dotenvy` before any of these run):
//!
//! - [`database`]: connection string and pool sizing
//! - [`jwt`]: bearer token secret and lifetime
//! - [`cors`]: allowed browser origins
//! - [`server`]: listen address
//! - [`notifications`]: parent notification queue sizing
//!
//! Every type exposes `from_env()` plus `from_lookup()`, which takes the
//! variable source as a closure so parsing can be tested without touching the
//! process environment.

pub mod cors;
pub mod database;
pub mod jwt;
pub mod notifications;
pub mod server;

pub use cors::CorsConfig;
pub use database::DatabaseConfig;
pub use jwt::JwtConfig;
pub use notifications::NotificationConfig;
pub use server::ServerConfig;
