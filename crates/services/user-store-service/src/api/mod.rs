//! HTTP API layer.

pub mod extractors;
pub mod handlers;
pub mod middleware;
mod routes;
mod state;
pub mod uploads;

pub use routes::create_router;
pub use state::AppState;
