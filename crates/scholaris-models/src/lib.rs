//! # Scholaris Models
//!
//! Domain entities shared by the API server and the CLI:
//!
//! - [`ids`]: strongly-typed `Uuid` newtypes per entity
//! - [`roles`]: the closed [`Role`] enumeration
//! - [`users`]: users, schools and the authenticated [`Identity`]
//! - [`students`]: students and wallet summaries
//! - [`wallet`]: the append-only wallet ledger
//! - [`canteen`]: canteen items and point-of-sale orders
//! - [`invoices`]: fee structures, invoices and payments
//! - [`notifications`]: parent notifications and preferences
//! - [`audit`]: audit trail entries
//!
//! Money is [`rust_decimal::Decimal`] throughout, stored as `NUMERIC(12,2)`.

pub mod audit;
pub mod canteen;
pub mod ids;
pub mod invoices;
pub mod notifications;
pub mod roles;
pub mod students;
pub mod users;
pub mod wallet;

pub use roles::Role;
pub use students::Student;
pub use users::{Identity, User};
pub use wallet::{WalletTransaction, WalletTxnType};
