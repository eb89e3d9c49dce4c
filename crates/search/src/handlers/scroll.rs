//! Scroll continuation handler.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cyverse_querydsl::error::QueryError;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::handlers::search::hits_of;
use crate::state::AppState;

/// Keep-alive used when a scroll request does not give one.
pub const DEFAULT_KEEP_ALIVE: &str = "1m";

/// Body of a scroll request.
#[derive(Debug, Deserialize)]
pub struct ScrollRequest {
    /// Scroll ID returned by the previous page.
    pub scroll_id: String,
    /// How long to keep the scroll context open.
    #[serde(default = "default_keep_alive")]
    pub scroll: String,
}

fn default_keep_alive() -> String {
    DEFAULT_KEEP_ALIVE.to_string()
}

/// Fetches the next page of a scrolled search.
///
/// # HTTP Request
///
/// `POST /data/scroll` with `{"scroll_id": "...", "scroll": "1m"}`
///
/// # Response
///
/// The next `hits` object, with its `_scroll_id`.
pub async fn scroll_handler(State(state): State<AppState>, body: Bytes) -> ApiResult<Response> {
    let request: ScrollRequest =
        serde_json::from_slice(&body).map_err(|e| ApiError::bad_request(e.to_string()))?;
    if request.scroll_id.is_empty() {
        return Err(ApiError::bad_request("'scroll_id' must be non-empty"));
    }

    debug!(keep_alive = %request.scroll, "Continuing scroll");
    let response = state
        .executor()
        .scroll(&request.scroll_id, &request.scroll)
        .await
        .map_err(QueryError::from)?;

    Ok((StatusCode::OK, Json(hits_of(response))).into_response())
}
