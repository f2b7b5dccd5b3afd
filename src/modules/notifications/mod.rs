pub mod controller;
pub mod router;
pub mod service;

pub use router::init_notifications_router;
pub use service::{NotificationDispatcher, OutgoingNotification};
