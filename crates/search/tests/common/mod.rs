//! Common test utilities for search service testing.
//!
//! - [`RecordingExecutor`] - in-memory index recording every request
//! - [`FakeResolver`] - identity resolver with canned answers
//! - [`create_test_server`] - test server over the fakes

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_test::TestServer;
use serde_json::{Value, json};

use cyverse_querydsl::error::BackendError;
use cyverse_querydsl::executor::{DocumentKind, ExecutorResult, IndexExecutor};
use cyverse_querydsl::identity::{Identity, IdentityError, IdentityResolver};
use cyverse_search::{ServerConfig, create_app};

/// Index executor answering from canned values and recording requests.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    /// Count returned for every count request.
    pub count: u64,
    /// Search bodies received, with their scroll keep-alive.
    pub searches: Mutex<Vec<(Value, Option<String>)>>,
    /// Count requests received.
    pub counts: Mutex<Vec<(DocumentKind, Value)>>,
    /// Scroll requests received.
    pub scrolls: Mutex<Vec<(String, String)>>,
}

impl RecordingExecutor {
    /// Creates an executor whose counts all return `count`.
    pub fn with_count(count: u64) -> Arc<Self> {
        Arc::new(Self {
            count,
            ..Default::default()
        })
    }

    /// Returns the number of searches received.
    pub fn search_calls(&self) -> usize {
        self.searches.lock().unwrap().len()
    }

    /// Returns the last search body received.
    pub fn last_search(&self) -> Value {
        self.searches
            .lock()
            .unwrap()
            .last()
            .map(|(body, _)| body.clone())
            .expect("no search was run")
    }
}

fn sample_hits() -> Value {
    json!({
        "total": 1,
        "max_score": 1.0,
        "hits": [{
            "_id": "1",
            "_source": {"path": "/iplant/home/ipcdev/reads.fq"},
            "fields": {"permission": ["own"]}
        }]
    })
}

#[async_trait]
impl IndexExecutor for RecordingExecutor {
    async fn search(&self, body: Value, scroll: Option<&str>) -> ExecutorResult<Value> {
        self.searches
            .lock()
            .unwrap()
            .push((body, scroll.map(str::to_string)));

        let mut response = json!({"took": 2, "timed_out": false, "hits": sample_hits()});
        if scroll.is_some() {
            response["_scroll_id"] = json!("scroll-1");
        }
        Ok(response)
    }

    async fn count(&self, kind: DocumentKind, query: Value) -> ExecutorResult<u64> {
        self.counts.lock().unwrap().push((kind, query));
        Ok(self.count)
    }

    async fn scroll(&self, scroll_id: &str, keep_alive: &str) -> ExecutorResult<Value> {
        self.scrolls
            .lock()
            .unwrap()
            .push((scroll_id.to_string(), keep_alive.to_string()));

        if scroll_id != "scroll-1" {
            return Err(BackendError::RequestFailed {
                operation: "scroll",
                status: 404,
                body: "no search context found".to_string(),
            });
        }
        Ok(json!({"_scroll_id": "scroll-2", "hits": {"total": 1, "hits": []}}))
    }
}

/// Identity resolver answering from a fixed table.
#[derive(Debug, Default)]
pub struct FakeResolver {
    users: HashMap<String, Vec<String>>,
}

impl FakeResolver {
    /// Adds a known user with its groups.
    pub fn with_user(mut self, user: &str, groups: &[&str]) -> Self {
        self.users.insert(
            user.to_string(),
            groups.iter().map(|g| g.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl IdentityResolver for FakeResolver {
    async fn resolve(&self, user: &str) -> Result<Identity, IdentityError> {
        match self.users.get(user) {
            Some(groups) => Ok(Identity::new(format!("{}#iplant", user), groups.clone())),
            None => Err(IdentityError::Upstream {
                status: 404,
                body: json!({"error_code": "ERR_NOT_A_USER", "user": user}).to_string(),
            }),
        }
    }
}

/// Default resolver knowing `ipcdev` in group `de-users`.
pub fn default_resolver() -> Arc<FakeResolver> {
    Arc::new(FakeResolver::default().with_user("ipcdev", &["de-users"]))
}

/// Creates a test server over `executor` and `resolver`.
pub fn create_test_server(
    executor: Arc<RecordingExecutor>,
    resolver: Arc<FakeResolver>,
    config: ServerConfig,
) -> TestServer {
    let app = create_app(executor, resolver, config);
    TestServer::new(app).expect("Failed to create test server")
}
