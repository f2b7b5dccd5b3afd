//! # Scholaris CLI
//!
//! Administration and seeding utilities for Scholaris development.
//!
//! ```ignore
//! use scholaris_cli::seeder::{seed_all, SeedConfig};
//!
//! let config = SeedConfig::new(3); // 3 schools with defaults
//! seed_all(&pool, config).await?;
//! ```

pub mod admin;
pub mod seeder;
