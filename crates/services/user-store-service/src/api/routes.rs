//! Route configuration.

use axum::{extract::DefaultBodyLimit, middleware, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{health_routes, record_routes};
use super::middleware::auth_middleware;
use super::state::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (no auth)
        .nest("/health", health_routes())
        // Record routes (auth required)
        .merge(record_routes().route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        )))
        .layer(DefaultBodyLimit::max(state.body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
