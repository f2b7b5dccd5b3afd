//! # Scholaris Auth
//!
//! Bearer token handling for the Scholaris API.
//!
//! - [`claims`]: the access token [`Claims`]
//! - [`jwt`]: HS256 token creation and verification
//!
//! Tokens carry only the user id and email. The HTTP layer resolves the full
//! caller identity (role, school, active flag) from storage after
//! verification.

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::{create_access_token, verify_token};
