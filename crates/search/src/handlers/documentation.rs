//! Clause documentation endpoint.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::state::AppState;

/// Lists every registered clause type with its summary and arguments.
///
/// # HTTP Request
///
/// `GET /data/documentation`
///
/// # Response
///
/// `{"clauses": {"<type>": {"summary": "...", "args": {...}}, ...}}`
pub async fn documentation_handler(State(state): State<AppState>) -> Response {
    let clauses = state.translator().registry().describe();
    debug!(count = clauses.len(), "Describing clause types");

    let body = serde_json::json!({ "clauses": clauses });
    (StatusCode::OK, Json(body)).into_response()
}
