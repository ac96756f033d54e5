use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // REST API routes
        .route(
            "/v1/translations",
            post(handlers::store).get(handlers::index),
        )
        .route("/v1/translations/:id", get(handlers::show))
}
