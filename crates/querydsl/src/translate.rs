//! Clause-tree translation.
//!
//! [`Translator`] walks a [`GenericClause`] tree and compiles it into a single
//! Elasticsearch query. Every child of a Query node is translated on its own
//! task, so slow processors (the tag ownership probe, for instance) overlap
//! with their siblings. Results are slotted back by list position, which keeps
//! the compiled query identical no matter which child finishes first.
//!
//! The first failing child fails the whole translation: the remaining
//! siblings at that level are cancelled and their results discarded.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tokio::task::JoinSet;
use tracing::debug;

use crate::clause::{Clause, GenericClause, Query};
use crate::dsl::BoolQuery;
use crate::error::{QueryError, QueryResult};
use crate::registry::Registry;
use crate::scope::RequestScope;

type TranslateFuture = Pin<Box<dyn Future<Output = QueryResult<Value>> + Send + 'static>>;

/// Which list of a Query a child came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Occur {
    All,
    Any,
    None,
}

/// Compiles clause trees using the processors of a [`Registry`].
///
/// ```
/// use std::sync::Arc;
/// use cyverse_querydsl::clause::parse_tree;
/// use cyverse_querydsl::registry::Registry;
/// use cyverse_querydsl::scope::RequestScope;
/// use cyverse_querydsl::translate::Translator;
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let translator = Translator::new(Arc::new(Registry::with_builtin_clauses()));
/// let tree = parse_tree(json!({"all": [{"type": "path", "args": {"prefix": "/iplant"}}]})).unwrap();
/// let query = translator.translate(&RequestScope::new(), tree).await.unwrap();
/// assert_eq!(query, json!({"bool": {"must": [{"prefix": {"path": "/iplant"}}]}}));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Translator {
    registry: Arc<Registry>,
}

impl Translator {
    /// Creates a translator over `registry`.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Returns the registry used for lookups.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Translates `tree` into a compiled query.
    ///
    /// Processors receive `scope` (or a child of it, for nested levels).
    /// Cancelling the scope's token ends the translation with
    /// [`QueryError::Cancelled`].
    pub async fn translate(&self, scope: &RequestScope, tree: GenericClause) -> QueryResult<Value> {
        translate_node(Arc::clone(&self.registry), scope.clone(), tree).await
    }

    /// Renders `tree` as a short human-readable string.
    ///
    /// `all` children are joined with ` AND `, `any` children with ` OR `,
    /// and `none` children are prefixed with `NOT`. Clauses without a
    /// registered summarizer render as `type=<args>`.
    pub fn summarize(&self, tree: &GenericClause) -> QueryResult<String> {
        match tree {
            GenericClause::Clause(clause) => self.summarize_clause(clause),
            GenericClause::Query(query) => self.summarize_query(query),
        }
    }

    fn summarize_clause(&self, clause: &Clause) -> QueryResult<String> {
        let clause_type = clause.clause_type.as_str();
        if !self.registry.contains(clause_type) {
            return Err(QueryError::UnknownClauseType {
                clause_type: clause.clause_type.clone(),
            });
        }

        match self.registry.summarizer(clause_type) {
            Some(summarizer) => summarizer.summarize(&clause.args),
            None => Ok(format!(
                "{}={}",
                clause_type,
                Value::Object(clause.args.clone())
            )),
        }
    }

    fn summarize_query(&self, query: &Query) -> QueryResult<String> {
        let nested = |child: &GenericClause| -> QueryResult<String> {
            let summary = self.summarize(child)?;
            Ok(match child {
                GenericClause::Query(_) => format!("({})", summary),
                GenericClause::Clause(_) => summary,
            })
        };

        let mut parts = query
            .all
            .iter()
            .map(nested)
            .collect::<QueryResult<Vec<_>>>()?;

        let any = query
            .any
            .iter()
            .map(nested)
            .collect::<QueryResult<Vec<_>>>()?;
        match any.len() {
            0 => {}
            1 if parts.is_empty() => parts.extend(any),
            _ => parts.push(format!("({})", any.join(" OR "))),
        }

        for child in &query.none {
            parts.push(format!("NOT {}", nested(child)?));
        }

        if parts.is_empty() {
            return Ok("*".to_string());
        }
        Ok(parts.join(" AND "))
    }
}

fn translate_node(registry: Arc<Registry>, scope: RequestScope, node: GenericClause) -> TranslateFuture {
    Box::pin(async move {
        match node {
            GenericClause::Clause(clause) => translate_clause(&registry, &scope, clause).await,
            GenericClause::Query(query) => translate_query(registry, scope, query).await,
        }
    })
}

async fn translate_clause(registry: &Registry, scope: &RequestScope, clause: Clause) -> QueryResult<Value> {
    let processor = registry
        .lookup(clause.clause_type.as_str())
        .ok_or_else(|| QueryError::UnknownClauseType {
            clause_type: clause.clause_type.clone(),
        })?;

    let start = Instant::now();
    let result = processor.process(scope, &clause.args).await;
    debug!(
        clause_type = %clause.clause_type,
        correlation_id = scope.correlation_id().unwrap_or_default(),
        elapsed_us = start.elapsed().as_micros() as u64,
        ok = result.is_ok(),
        "Translated clause"
    );
    result
}

async fn translate_query(registry: Arc<Registry>, scope: RequestScope, query: Query) -> QueryResult<Value> {
    if scope.is_cancelled() {
        return Err(QueryError::Cancelled);
    }

    let level = scope.child();
    let mut must: Vec<Option<Value>> = vec![None; query.all.len()];
    let mut should: Vec<Option<Value>> = vec![None; query.any.len()];
    let mut must_not: Vec<Option<Value>> = vec![None; query.none.len()];

    let mut tasks = JoinSet::new();
    for (occur, children) in [
        (Occur::All, query.all),
        (Occur::Any, query.any),
        (Occur::None, query.none),
    ] {
        for (position, child) in children.into_iter().enumerate() {
            let translation = translate_node(Arc::clone(&registry), level.clone(), child);
            tasks.spawn(async move { (occur, position, translation.await) });
        }
    }

    // Dropping `tasks` on an early return aborts every unfinished sibling.
    loop {
        let joined = tokio::select! {
            biased;
            _ = level.cancellation().cancelled() => return Err(QueryError::Cancelled),
            joined = tasks.join_next() => joined,
        };
        let Some(joined) = joined else {
            break;
        };

        let (occur, position, result) = match joined {
            Ok(tagged) => tagged,
            Err(e) => {
                level.cancellation().cancel();
                return Err(QueryError::Internal {
                    message: format!("clause translation task failed: {}", e),
                });
            }
        };

        let value = match result {
            Ok(value) => value,
            Err(e) => {
                level.cancellation().cancel();
                return Err(e);
            }
        };

        let slots = match occur {
            Occur::All => &mut must,
            Occur::Any => &mut should,
            Occur::None => &mut must_not,
        };
        slots[position] = Some(value);
    }

    let mut compiled = must.into_iter().flatten().fold(BoolQuery::new(), BoolQuery::must);
    if !should.is_empty() {
        compiled = compiled
            .should(should.into_iter().flatten())
            .minimum_should_match(1);
    }
    compiled = must_not
        .into_iter()
        .flatten()
        .fold(compiled, BoolQuery::must_not);

    Ok(compiled.into_value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::{ClauseArgs, ClauseDocumentation, ClauseProcessor, parse_tree};
    use async_trait::async_trait;
    use serde_json::json;

    fn translator() -> Translator {
        Translator::new(Arc::new(Registry::with_builtin_clauses()))
    }

    #[tokio::test]
    async fn test_single_clause_passes_through() {
        let tree = parse_tree(json!({"type": "path", "args": {"prefix": "/a"}})).unwrap();
        let out = translator().translate(&RequestScope::new(), tree).await.unwrap();
        assert_eq!(out, json!({"prefix": {"path": "/a"}}));
    }

    #[tokio::test]
    async fn test_lists_map_to_bool_occurrences() {
        let tree = parse_tree(json!({
            "all": [{"type": "path", "args": {"prefix": "/a"}}],
            "any": [
                {"type": "label", "args": {"label": "x", "exact": true}},
                {"type": "label", "args": {"label": "y", "exact": true}}
            ],
            "none": [{"type": "owner", "args": {"owner": "u#z"}}]
        }))
        .unwrap();
        let out = translator().translate(&RequestScope::new(), tree).await.unwrap();

        let bool_query = &out["bool"];
        assert_eq!(bool_query["must"], json!([{"prefix": {"path": "/a"}}]));
        assert_eq!(bool_query["should"][0]["query_string"]["query"], json!("x"));
        assert_eq!(bool_query["should"][1]["query_string"]["query"], json!("y"));
        assert_eq!(bool_query["minimum_should_match"], json!(1));
        assert_eq!(bool_query["must_not"][0]["nested"]["path"], json!("userPermissions"));
    }

    #[tokio::test]
    async fn test_empty_query_matches_everything() {
        let out = translator()
            .translate(&RequestScope::new(), Query::default().into())
            .await
            .unwrap();
        assert_eq!(out, json!({"bool": {}}));
    }

    #[tokio::test]
    async fn test_unknown_type() {
        let tree = parse_tree(json!({"all": [{"type": "bogus", "args": {}}]})).unwrap();
        let err = translator()
            .translate(&RequestScope::new(), tree)
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::UnknownClauseType { ref clause_type } if clause_type.as_str() == "bogus"));
    }

    #[tokio::test]
    async fn test_processor_error_is_returned_verbatim() {
        let tree = parse_tree(json!({"all": [
            {"type": "path", "args": {"prefix": "/a"}},
            {"type": "size", "args": {"from": "enormous"}}
        ]}))
        .unwrap();
        let err = translator()
            .translate(&RequestScope::new(), tree)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("enormous"));
    }

    #[tokio::test]
    async fn test_cancelled_scope() {
        let scope = RequestScope::new();
        scope.cancellation().cancel();
        let tree = parse_tree(json!({"all": [{"type": "path", "args": {"prefix": "/a"}}]})).unwrap();
        let err = translator().translate(&scope, tree).await.unwrap_err();
        assert!(matches!(err, QueryError::Cancelled));
    }

    struct Panicking;

    #[async_trait]
    impl ClauseProcessor for Panicking {
        async fn process(&self, _scope: &RequestScope, _args: &ClauseArgs) -> QueryResult<Value> {
            panic!("processor bug");
        }
    }

    #[tokio::test]
    async fn test_panicking_processor_is_internal_error() {
        let mut registry = Registry::new();
        registry.register("boom", Arc::new(Panicking), ClauseDocumentation::new("panics"));
        let translator = Translator::new(Arc::new(registry));

        let tree = parse_tree(json!({"all": [{"type": "boom", "args": {}}]})).unwrap();
        let err = translator
            .translate(&RequestScope::new(), tree)
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Internal { .. }));
    }

    #[test]
    fn test_summarize_tree() {
        let tree = parse_tree(json!({
            "all": [
                {"type": "path", "args": {"prefix": "/iplant/home"}},
                {"any": [
                    {"type": "created", "args": {"from": "2017-01-01"}},
                    {"type": "modified", "args": {"to": "2018-01-01"}}
                ]}
            ],
            "none": [{"type": "path", "args": {"prefix": "/iplant/trash"}}]
        }))
        .unwrap();
        assert_eq!(
            translator().summarize(&tree).unwrap(),
            "path=\"/iplant/home\" AND ((created=2017-01-01-- OR modified=--2018-01-01)) AND NOT path=\"/iplant/trash\""
        );
    }

    #[test]
    fn test_summarize_without_summarizer() {
        let tree = parse_tree(json!({"any": [
            {"type": "label", "args": {"label": "x"}},
            {"type": "path", "args": {"prefix": "/a"}}
        ]}))
        .unwrap();
        assert_eq!(
            translator().summarize(&tree).unwrap(),
            "(label={\"label\":\"x\"} OR path=\"/a\")"
        );
    }

    #[test]
    fn test_summarize_unknown_type() {
        let tree = parse_tree(json!({"type": "bogus"})).unwrap();
        assert!(matches!(
            translator().summarize(&tree),
            Err(QueryError::UnknownClauseType { .. })
        ));
    }
}
