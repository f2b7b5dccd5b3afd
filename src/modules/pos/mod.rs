pub mod controller;
pub mod model;
pub mod pricing;
pub mod router;
pub mod service;

pub use router::init_pos_router;
