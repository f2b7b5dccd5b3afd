//! # Scholaris Core
//!
//! Foundational types shared by every Scholaris crate:
//!
//! - [`errors`]: [`AppError`] and the closed set of [`ErrorCode`]s, rendered as the
//!   `{success: false, error: {...}}` envelope
//! - [`response`]: the `{success: true, data, meta?}` envelope
//! - [`pagination`]: list pagination parameters and metadata
//! - [`serde`]: query-string deserialization helpers
//!
//! # Example
//!
//! ```ignore
//! use scholaris_core::{ApiResponse, AppError, ErrorCode};
//!
//! async fn handler() -> Result<ApiResponse<Item>, AppError> {
//!     let item = find_item().await?.ok_or_else(|| {
//!         AppError::msg(ErrorCode::NotFound, "Item not found")
//!     })?;
//!     Ok(ApiResponse::ok(item))
//! }
//! ```

pub mod errors;
pub mod pagination;
pub mod response;
pub mod serde;

pub use errors::{AppError, ErrorCode};
pub use pagination::{PaginationMeta, PaginationParams};
pub use response::ApiResponse;
