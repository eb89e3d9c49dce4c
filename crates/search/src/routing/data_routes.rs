//! Data search route configuration.

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::state::AppState;

/// Creates all search service routes.
///
/// # Routes
///
/// - `GET /` - Health check
/// - `GET /data/documentation` - Clause type documentation
/// - `POST /data/search` - Clause-tree search
/// - `POST /data/scroll` - Scroll continuation
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health_handler))
        .route("/data/documentation", get(handlers::documentation_handler))
        .route("/data/search", post(handlers::search_handler))
        .route("/data/scroll", post(handlers::scroll_handler))
        .with_state(state)
}
