//! `tag` clause restricted to tags created by the acting user.
//!
//! Registered over the base [`TagProcessor`] by services that can supply an
//! identity and an index executor in the [`RequestScope`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::tag::{self, TYPE_KEY, TagArgs, TagProcessor};
use crate::clause::{ClauseArgs, ClauseProcessor};
use crate::dsl::{self, BoolQuery};
use crate::error::{QueryError, QueryResult};
use crate::executor::DocumentKind;
use crate::registry::Registry;
use crate::scope::RequestScope;

/// Verifies every requested tag belongs to the acting user, then compiles the
/// clause like the base tag processor.
///
/// The probe counts over [`DocumentKind::Tag`]. The lookup index passed to
/// [`OwnedTagProcessor::new`] must be the one the executor resolves for it.
#[derive(Debug, Default, Clone)]
pub struct OwnedTagProcessor {
    base: TagProcessor,
}

impl OwnedTagProcessor {
    /// Creates the processor; compiled lookups read tags from `index`.
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            base: TagProcessor::new(index),
        }
    }
}

#[async_trait]
impl ClauseProcessor for OwnedTagProcessor {
    async fn process(&self, scope: &RequestScope, args: &ClauseArgs) -> QueryResult<Value> {
        let identity = scope.require_identity(TYPE_KEY)?;
        let executor = scope.require_executor(TYPE_KEY)?;
        let tag_args = TagArgs::decode(args)?;

        let probe = BoolQuery::new()
            .must(dsl::terms("id", tag_args.tags.iter().map(String::as_str)))
            .filter(dsl::term("creator", identity.user()))
            .into_value();

        let found = tokio::select! {
            biased;
            _ = scope.cancellation().cancelled() => return Err(QueryError::Cancelled),
            count = executor.count(DocumentKind::Tag, probe) => count?,
        };

        let expected = tag_args.tags.len();
        if found != expected as u64 {
            tracing::debug!(
                user = identity.user(),
                expected,
                found,
                "Tag ownership check failed"
            );
            return Err(QueryError::TagOwnershipMismatch { expected, found });
        }

        self.base.process(scope, args).await
    }
}

/// Registers the ownership-checking `tag` clause over the base one, reading
/// tags from `index`.
pub fn register(registry: &mut Registry, index: &str) {
    registry.register(TYPE_KEY, Arc::new(OwnedTagProcessor::new(index)), tag::documentation());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::executor::{ExecutorResult, IndexExecutor};
    use crate::identity::Identity;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingExecutor {
        count: u64,
        queries: Mutex<Vec<(DocumentKind, Value)>>,
    }

    #[async_trait]
    impl IndexExecutor for CountingExecutor {
        async fn search(&self, _body: Value, _scroll: Option<&str>) -> ExecutorResult<Value> {
            Err(BackendError::SerializationError {
                message: "search not expected".to_string(),
            })
        }

        async fn count(&self, kind: DocumentKind, query: Value) -> ExecutorResult<u64> {
            self.queries.lock().unwrap().push((kind, query));
            Ok(self.count)
        }

        async fn scroll(&self, _scroll_id: &str, _keep_alive: &str) -> ExecutorResult<Value> {
            Err(BackendError::SerializationError {
                message: "scroll not expected".to_string(),
            })
        }
    }

    fn scope_with(executor: Arc<CountingExecutor>) -> RequestScope {
        RequestScope::new()
            .with_identity(Identity::new("ipcdev", vec![]))
            .with_executor(executor)
    }

    #[tokio::test]
    async fn test_owned_tags_delegate_to_base() {
        let executor = Arc::new(CountingExecutor {
            count: 2,
            ..Default::default()
        });
        let args = json!({"tags": ["t1", "t2"]});
        let out = OwnedTagProcessor::new("tags")
            .process(&scope_with(executor.clone()), args.as_object().unwrap())
            .await
            .unwrap();
        assert_eq!(
            out,
            json!({"bool": {"should": [
                {"terms": {"id": {"index": "tags", "id": "t1", "path": "targets.id"}}},
                {"terms": {"id": {"index": "tags", "id": "t2", "path": "targets.id"}}}
            ]}})
        );

        let queries = executor.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].0, DocumentKind::Tag);
        assert_eq!(
            queries[0].1,
            json!({"bool": {
                "must": [{"terms": {"id": ["t1", "t2"]}}],
                "filter": [{"term": {"creator": "ipcdev"}}]
            }})
        );
    }

    #[tokio::test]
    async fn test_count_mismatch() {
        let executor = Arc::new(CountingExecutor {
            count: 2,
            ..Default::default()
        });
        let args = json!({"tags": ["t1", "t2", "t3"]});
        let err = OwnedTagProcessor::default()
            .process(&scope_with(executor), args.as_object().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::TagOwnershipMismatch {
                expected: 3,
                found: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_identity() {
        let args = json!({"tags": ["t1"]});
        let scope = RequestScope::new().with_executor(Arc::new(CountingExecutor::default()));
        let err = OwnedTagProcessor::default()
            .process(&scope, args.as_object().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::MissingContext { what: "an acting user", .. }));
    }

    #[tokio::test]
    async fn test_missing_executor() {
        let args = json!({"tags": ["t1"]});
        let scope = RequestScope::new().with_identity(Identity::new("ipcdev", vec![]));
        let err = OwnedTagProcessor::default()
            .process(&scope, args.as_object().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::MissingContext { what: "an index executor", .. }));
    }

    #[test]
    fn test_register_replaces_base() {
        let mut registry = Registry::with_builtin_clauses();
        let before = registry.len();
        register(&mut registry, "tags");
        assert_eq!(registry.len(), before);
        assert!(registry.lookup(TYPE_KEY).is_some());
    }
}
