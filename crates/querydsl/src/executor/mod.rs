//! Index query execution contract.
//!
//! The engine never talks to the index directly. The search orchestration
//! runs compiled queries through an [`IndexExecutor`], and clause processors
//! that need a lookup (the tag ownership probe) reach it through the
//! [`RequestScope`](crate::scope::RequestScope).
//!
//! Enable the `elasticsearch` feature for [`elasticsearch::ElasticsearchExecutor`].

#[cfg(feature = "elasticsearch")]
pub mod elasticsearch;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BackendError;

/// Which family of documents a count runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// File and folder documents.
    Data,
    /// Tag documents.
    Tag,
}

/// Result type alias for executor operations.
pub type ExecutorResult<T> = Result<T, BackendError>;

/// Runs compiled queries against the backing index.
///
/// Implementations are shared by every in-flight request and every clause
/// task, so they must be safe for concurrent use.
#[async_trait]
pub trait IndexExecutor: Send + Sync {
    /// Runs a full search body (`query`, `size`, `from`, `sort`, ...).
    ///
    /// When `scroll` is set, a scroll context with that keep-alive is opened
    /// and the response carries a `_scroll_id`.
    async fn search(&self, body: Value, scroll: Option<&str>) -> ExecutorResult<Value>;

    /// Counts the documents of `kind` matching `query`.
    async fn count(&self, kind: DocumentKind, query: Value) -> ExecutorResult<u64>;

    /// Fetches the next page of an open scroll context.
    async fn scroll(&self, scroll_id: &str, keep_alive: &str) -> ExecutorResult<Value>;
}
