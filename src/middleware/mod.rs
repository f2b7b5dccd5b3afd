//! Request authentication and role gates.
//!
//! - [`auth`]: the [`auth::AuthUser`] extractor (bearer token to [`scholaris_models::Identity`])
//! - [`role`]: role-restricted extractors built with [`crate::require_roles!`]
//!
//! Handlers declare the gate they need:
//!
//! ```ignore
//! async fn create_order(
//!     RequirePosStaff(auth_user): RequirePosStaff,
//!     ValidatedJson(dto): ValidatedJson<CreateOrderDto>,
//! ) -> Result<ApiResponse<PosOrderDetail>, AppError> { ... }
//! ```

pub mod auth;
pub mod role;
