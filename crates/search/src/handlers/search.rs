//! Search endpoint handler.
//!
//! A search request carries a clause tree under `query`. The handler
//! compiles it for the acting user, always restricting the results to
//! documents that user can read, and returns the index's `hits`.

use std::time::{Duration, Instant};

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use cyverse_querydsl::clause::{Clause, parse_tree};
use cyverse_querydsl::error::QueryError;
use cyverse_querydsl::scope::RequestScope;
use cyverse_querydsl::sort::{ResolvedSort, SortSpec};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Header carrying the request's correlation ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Query parameters of a search request.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// The acting user.
    #[serde(default)]
    pub user: Option<String>,
}

/// Cancels its token once the deadline passes; dropping it stops the timer.
struct Deadline {
    token: CancellationToken,
    timer: JoinHandle<()>,
}

impl Deadline {
    fn after(duration: Duration) -> Self {
        let token = CancellationToken::new();
        let expired = token.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            expired.cancel();
        });
        Self { token, timer }
    }

    fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

/// Handler for clause-tree searches.
///
/// # HTTP Request
///
/// `POST /data/search?user=<name>`
///
/// # Request Body
///
/// - `query` - the clause tree (required)
/// - `size` / `from` - paging
/// - `sort` - list of `{"field": ..., "order": "ascending" | "descending"}`
/// - `scroll` - keep-alive for a scroll context, such as `"1m"`
///
/// # Response
///
/// - `200 OK` - the index's `hits` object (with `_scroll_id` when scrolling)
/// - `400 Bad Request` - missing user, malformed body or invalid tree
/// - identity service status - relayed when the user lookup fails upstream
pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let user = params
        .user
        .filter(|u| !u.is_empty())
        .ok_or_else(|| {
            ApiError::bad_request("The 'user' query parameter must be provided and non-empty")
        })?;

    let body: Map<String, Value> =
        serde_json::from_slice(&body).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let query = body
        .get("query")
        .cloned()
        .ok_or_else(|| ApiError::bad_request("Provided body did not contain a 'query' key"))?;

    let config = state.config();
    let size = extract_count(&body, "size", config.default_page_size)?;
    let from = extract_count(&body, "from", 0)?;
    let scroll = match body.get("scroll") {
        None | Some(Value::Null) => None,
        Some(Value::String(keep_alive)) => Some(keep_alive.clone()),
        Some(_) => return Err(ApiError::bad_request("'scroll' must be a string")),
    };

    let sorts = extract_sort(&body)?;
    let sorts = state.sort_fields().resolve(&sorts)?;

    let tree = parse_tree(query)?;
    let nodes = tree.node_count();
    if nodes > config.max_clause_count {
        return Err(ApiError::bad_request(format!(
            "clause tree has {} nodes, more than the limit of {}",
            nodes, config.max_clause_count
        )));
    }
    let depth = tree.depth();
    if depth > config.max_clause_depth {
        return Err(ApiError::bad_request(format!(
            "clause tree is {} levels deep, more than the limit of {}",
            depth, config.max_clause_depth
        )));
    }

    let identity = state.resolver().resolve(&user).await?;
    let users = identity.effective();

    let tree = tree.push_all(Clause::new(
        "permissions",
        json!({
            "users": users,
            "permission": "read",
            "permission_recurse": true,
            "exact": true,
        }),
    ));

    let correlation_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let translator = state.translator();
    if let Ok(summary) = translator.summarize(&tree) {
        info!(%user, correlation_id = %correlation_id, %summary, "Searching");
    }

    let deadline = Deadline::after(Duration::from_secs(config.request_timeout));
    let scope = RequestScope::new()
        .with_identity(identity)
        .with_executor(state.executor().clone())
        .with_cancellation(deadline.token())
        .with_correlation_id(correlation_id.clone());

    let started = Instant::now();
    let translated = translator.translate(&scope, tree).await?;
    debug!(
        correlation_id = %correlation_id,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Compiled clause tree"
    );

    let search_body = build_search_body(&users, translated, &sorts, size, from);
    let response = state
        .executor()
        .search(search_body, scroll.as_deref())
        .await
        .map_err(QueryError::from)?;

    Ok((StatusCode::OK, Json(hits_of(response))).into_response())
}

/// Reads a non-negative integer field, falling back to `default` when it is
/// absent or not a number.
fn extract_count(body: &Map<String, Value>, field: &str, default: usize) -> ApiResult<usize> {
    match body.get(field).and_then(Value::as_f64) {
        None => Ok(default),
        Some(n) if n < 0.0 => Err(ApiError::bad_request(format!(
            "'{}' must not be negative",
            field
        ))),
        Some(n) => Ok(n as usize),
    }
}

fn extract_sort(body: &Map<String, Value>) -> ApiResult<Vec<SortSpec>> {
    match body.get("sort") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(sort) => serde_json::from_value(sort.clone())
            .map_err(|e| ApiError::bad_request(format!("invalid sort: {}", e))),
    }
}

/// Builds the painless script computing the best permission any of `users`
/// holds on a document: `own` beats `write`, which beats `read`.
pub fn permission_script(users: &[String]) -> String {
    let users = Value::from(users.to_vec());
    format!(
        "String perm = null; \
         for (up in params._source.userPermissions) {{ \
         for (user in {users}) {{ \
         if (up.user == user && perm != 'own' && !(up.permission == 'read' && perm == 'write')) {{ \
         perm = up.permission \
         }} }} }} \
         perm"
    )
}

/// Assembles the full search request body.
pub fn build_search_body(
    users: &[String],
    query: Value,
    sorts: &[ResolvedSort],
    size: usize,
    from: usize,
) -> Value {
    let mut body = json!({
        "_source": true,
        "script_fields": {
            "permission": {
                "script": {
                    "lang": "painless",
                    "source": permission_script(users),
                }
            }
        },
        "size": size,
        "from": from,
        "query": query,
    });

    if !sorts.is_empty() {
        body["sort"] = Value::Array(sorts.iter().map(ResolvedSort::to_value).collect());
    }

    body
}

/// Extracts the `hits` object from a search response, carrying the scroll
/// ID along when the response has one.
pub(crate) fn hits_of(mut response: Value) -> Value {
    let mut hits = response
        .get_mut("hits")
        .map(Value::take)
        .unwrap_or_else(|| json!({}));

    if let (Some(scroll_id), Value::Object(hits)) = (response.get("_scroll_id"), &mut hits) {
        hits.insert("_scroll_id".to_string(), scroll_id.clone());
    }

    hits
}
