pub mod controller;
pub mod ledger;
pub mod model;
pub mod router;
pub mod service;

pub use ledger::{LedgerEntry, LedgerError, LedgerOutcome, process_transaction};
pub use router::init_wallet_router;
