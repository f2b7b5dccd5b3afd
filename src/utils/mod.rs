//! Shared helpers used across feature modules.
//!
//! - [`tenant`]: school scoping for queries and fetched entities
//! - [`audit`]: transactional audit log writes

pub mod audit;
pub mod tenant;
