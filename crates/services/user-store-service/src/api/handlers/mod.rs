//! HTTP request handlers.

pub mod health_handler;
pub mod record_handler;

pub use health_handler::health_routes;
pub use record_handler::{record_routes, StorePath};
