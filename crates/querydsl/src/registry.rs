//! Clause type registry.
//!
//! The registry maps clause type names to their processors, documentation and
//! optional summarizers. It is populated once at startup and then shared
//! read-only behind an `Arc`, so lookups need no locking.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::clause::{ClauseDocumentation, ClauseProcessor, ClauseSummarizer, ClauseType};
use crate::clauses;

struct Entry {
    processor: Arc<dyn ClauseProcessor>,
    documentation: ClauseDocumentation,
    summarizer: Option<Arc<dyn ClauseSummarizer>>,
}

/// Mapping from clause type to processor, documentation and summarizer.
#[derive(Default)]
pub struct Registry {
    entries: HashMap<ClauseType, Entry>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<&str> = self.entries.keys().map(ClauseType::as_str).collect();
        types.sort_unstable();
        f.debug_struct("Registry").field("clause_types", &types).finish()
    }
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in clause type.
    ///
    /// The `tag` entry is the base tag processor; services that can verify
    /// tag ownership register [`OwnedTagProcessor`](crate::clauses::owned_tag::OwnedTagProcessor)
    /// over it.
    pub fn with_builtin_clauses() -> Self {
        let mut registry = Self::new();
        clauses::label::register(&mut registry);
        clauses::path::register(&mut registry);
        clauses::owner::register(&mut registry);
        clauses::permissions::register(&mut registry);
        clauses::metadata::register(&mut registry);
        clauses::created::register(&mut registry);
        clauses::modified::register(&mut registry);
        clauses::size::register(&mut registry);
        clauses::tag::register(&mut registry);
        registry
    }

    /// Registers a processor. An existing entry for the same type is replaced.
    pub fn register(
        &mut self,
        clause_type: impl Into<ClauseType>,
        processor: Arc<dyn ClauseProcessor>,
        documentation: ClauseDocumentation,
    ) {
        self.insert(clause_type.into(), processor, documentation, None);
    }

    /// Registers a processor together with a summarizer.
    pub fn register_summarized(
        &mut self,
        clause_type: impl Into<ClauseType>,
        processor: Arc<dyn ClauseProcessor>,
        documentation: ClauseDocumentation,
        summarizer: Arc<dyn ClauseSummarizer>,
    ) {
        self.insert(clause_type.into(), processor, documentation, Some(summarizer));
    }

    fn insert(
        &mut self,
        clause_type: ClauseType,
        processor: Arc<dyn ClauseProcessor>,
        documentation: ClauseDocumentation,
        summarizer: Option<Arc<dyn ClauseSummarizer>>,
    ) {
        if self.entries.contains_key(&clause_type) {
            tracing::debug!(clause_type = %clause_type, "Replacing registered clause type");
        }
        self.entries.insert(
            clause_type,
            Entry {
                processor,
                documentation,
                summarizer,
            },
        );
    }

    /// Returns the processor for `clause_type`.
    pub fn lookup(&self, clause_type: &str) -> Option<Arc<dyn ClauseProcessor>> {
        self.entries
            .get(clause_type)
            .map(|entry| Arc::clone(&entry.processor))
    }

    /// Returns the summarizer for `clause_type`, if one was registered.
    pub fn summarizer(&self, clause_type: &str) -> Option<Arc<dyn ClauseSummarizer>> {
        self.entries
            .get(clause_type)
            .and_then(|entry| entry.summarizer.clone())
    }

    /// Returns the documentation of every registered clause type, ordered by type.
    pub fn describe(&self) -> BTreeMap<ClauseType, ClauseDocumentation> {
        self.entries
            .iter()
            .map(|(clause_type, entry)| (clause_type.clone(), entry.documentation.clone()))
            .collect()
    }

    /// Returns true if `clause_type` is registered.
    pub fn contains(&self, clause_type: &str) -> bool {
        self.entries.contains_key(clause_type)
    }

    /// Returns the number of registered clause types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::ClauseArgs;
    use crate::error::QueryResult;
    use crate::scope::RequestScope;
    use async_trait::async_trait;
    use serde_json::{Value, json};

    struct Fixed(&'static str);

    #[async_trait]
    impl ClauseProcessor for Fixed {
        async fn process(&self, _scope: &RequestScope, _args: &ClauseArgs) -> QueryResult<Value> {
            Ok(json!({ "fixed": self.0 }))
        }
    }

    #[test]
    fn test_builtin_clause_types() {
        let registry = Registry::with_builtin_clauses();
        let types: Vec<String> = registry
            .describe()
            .keys()
            .map(|t| t.to_string())
            .collect();
        assert_eq!(
            types,
            vec![
                "created",
                "label",
                "metadata",
                "modified",
                "owner",
                "path",
                "permissions",
                "size",
                "tag"
            ]
        );
        assert!(registry.summarizer("path").is_some());
        assert!(registry.summarizer("created").is_some());
        assert!(registry.summarizer("label").is_none());
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let mut registry = Registry::new();
        registry.register("tag", Arc::new(Fixed("first")), ClauseDocumentation::new("first"));
        registry.register("tag", Arc::new(Fixed("second")), ClauseDocumentation::new("second"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.describe()[&ClauseType::new("tag")].summary, "second");

        let processor = registry.lookup("tag").unwrap();
        let out = processor
            .process(&RequestScope::new(), &ClauseArgs::new())
            .await
            .unwrap();
        assert_eq!(out, json!({"fixed": "second"}));
    }

    #[test]
    fn test_lookup_is_exact() {
        let registry = Registry::with_builtin_clauses();
        assert!(registry.lookup("label").is_some());
        assert!(registry.lookup("Label").is_none());
        assert!(registry.lookup("").is_none());
    }

    #[test]
    fn test_documentation_serializes_with_type_key() {
        let registry = Registry::with_builtin_clauses();
        let docs = serde_json::to_value(registry.describe()).unwrap();
        assert_eq!(docs["label"]["args"]["label"]["type"], json!("string"));
        assert_eq!(docs["tag"]["args"]["tags"]["type"], json!("[]string"));
    }
}
