//! Health check endpoint handler.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::debug;

/// Handler for the health check endpoint.
///
/// # HTTP Request
///
/// `GET /`
pub async fn health_handler() -> Response {
    debug!("Processing health check request");

    let body = serde_json::json!({ "service": "search" });
    (StatusCode::OK, Json(body)).into_response()
}
