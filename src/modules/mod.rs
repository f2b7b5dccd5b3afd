pub mod finance;
pub mod health;
pub mod notifications;
pub mod pos;
pub mod students;
pub mod wallet;
