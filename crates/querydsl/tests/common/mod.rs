//! Common test utilities for translation testing.
//!
//! - [`FakeExecutor`] - in-memory [`IndexExecutor`] with canned answers
//! - [`DelayedProcessor`] - clause processor that sleeps before answering
//! - tree builders for large synthetic clause trees

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use cyverse_querydsl::clause::{
    Clause, ClauseArgs, ClauseDocumentation, ClauseProcessor, GenericClause, Query,
};
use cyverse_querydsl::error::{BackendError, QueryError, QueryResult};
use cyverse_querydsl::executor::{DocumentKind, ExecutorResult, IndexExecutor};
use cyverse_querydsl::identity::Identity;
use cyverse_querydsl::registry::Registry;
use cyverse_querydsl::scope::RequestScope;

/// Index executor answering counts with a fixed number and recording calls.
#[derive(Debug, Default)]
pub struct FakeExecutor {
    /// Count returned for every count request.
    pub count: u64,
    /// Every count request received, in order.
    pub counts: Mutex<Vec<(DocumentKind, Value)>>,
}

impl FakeExecutor {
    /// Creates an executor whose counts all return `count`.
    pub fn with_count(count: u64) -> Arc<Self> {
        Arc::new(Self {
            count,
            ..Default::default()
        })
    }

    /// Returns the number of count requests received.
    pub fn count_calls(&self) -> usize {
        self.counts.lock().unwrap().len()
    }
}

#[async_trait]
impl IndexExecutor for FakeExecutor {
    async fn search(&self, _body: Value, _scroll: Option<&str>) -> ExecutorResult<Value> {
        Ok(json!({"hits": {"total": 0, "hits": []}}))
    }

    async fn count(&self, kind: DocumentKind, query: Value) -> ExecutorResult<u64> {
        self.counts.lock().unwrap().push((kind, query));
        Ok(self.count)
    }

    async fn scroll(&self, _scroll_id: &str, _keep_alive: &str) -> ExecutorResult<Value> {
        Err(BackendError::RequestFailed {
            operation: "scroll",
            status: 404,
            body: "no scroll context".to_string(),
        })
    }
}

/// Returns `{"marker": <id>}` after sleeping `delay_ms` milliseconds, or
/// fails with a validation error when `fail` is set.
#[derive(Debug, Default)]
pub struct DelayedProcessor {
    /// Number of invocations that ran to completion.
    pub completed: AtomicUsize,
}

#[async_trait]
impl ClauseProcessor for DelayedProcessor {
    async fn process(&self, _scope: &RequestScope, args: &ClauseArgs) -> QueryResult<Value> {
        let delay = args.get("delay_ms").and_then(Value::as_u64).unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;

        if args.get("fail").and_then(Value::as_bool).unwrap_or(false) {
            return Err(QueryError::validation("delayed", format!("failed after {}ms", delay)));
        }

        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(json!({ "marker": args.get("id").cloned().unwrap_or(Value::Null) }))
    }
}

/// Builtin registry plus a `delayed` clause backed by `processor`.
pub fn registry_with_delayed(processor: Arc<DelayedProcessor>) -> Registry {
    let mut registry = Registry::with_builtin_clauses();
    registry.register(
        "delayed",
        processor,
        ClauseDocumentation::new("Sleeps, then returns a marker"),
    );
    registry
}

/// A `delayed` clause.
pub fn delayed(id: &str, delay_ms: u64) -> GenericClause {
    Clause::new("delayed", json!({"id": id, "delay_ms": delay_ms})).into()
}

/// A `delayed` clause that fails.
pub fn delayed_failure(delay_ms: u64) -> GenericClause {
    Clause::new("delayed", json!({"delay_ms": delay_ms, "fail": true})).into()
}

/// A scope acting as `user` with `executor` available.
pub fn scope_for(user: &str, executor: Arc<FakeExecutor>) -> RequestScope {
    RequestScope::new()
        .with_identity(Identity::new(user, vec!["de-users".to_string()]))
        .with_executor(executor)
}

/// Builds a tree `depth` levels deep in which every Query has `breadth`
/// children in `all`; leaves are `path` clauses numbered left to right.
pub fn wide_tree(depth: usize, breadth: usize) -> GenericClause {
    fn build(depth: usize, breadth: usize, next: &mut usize) -> GenericClause {
        if depth <= 1 {
            *next += 1;
            return Clause::new("path", json!({"prefix": format!("/leaf/{}", next)})).into();
        }
        let mut query = Query::default();
        for _ in 0..breadth {
            query = query.with_all(build(depth - 1, breadth, next));
        }
        query.into()
    }
    let mut next = 0;
    build(depth, breadth, &mut next)
}
