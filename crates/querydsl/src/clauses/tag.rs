//! `tag` clause: matches objects targeted by any of a set of tags.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::clause::{ClauseArgs, ClauseDocumentation, ClauseProcessor, decode_args};
use crate::dsl::{self, BoolQuery};
use crate::error::{QueryError, QueryResult};
use crate::registry::Registry;
use crate::scope::RequestScope;

/// Registry key of this clause.
pub const TYPE_KEY: &str = "tag";

/// Index read by tag lookups when none is configured.
pub const DEFAULT_TAG_INDEX: &str = "data";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct TagArgs {
    pub(crate) tags: Vec<String>,
}

impl TagArgs {
    pub(crate) fn decode(args: &ClauseArgs) -> QueryResult<Self> {
        let args: TagArgs = decode_args(TYPE_KEY, args)?;
        if args.tags.is_empty() {
            return Err(QueryError::validation(
                TYPE_KEY,
                "no tags were passed, cannot create clause",
            ));
        }
        Ok(args)
    }
}

/// Compiles to one terms lookup per tag, any of which may match.
///
/// Each lookup reads the `targets.id` list of the tag document in the tag
/// index and matches data documents whose `id` is in it.
#[derive(Debug, Clone)]
pub struct TagProcessor {
    index: String,
}

impl TagProcessor {
    /// Creates a processor whose lookups read tag documents from `index`.
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
        }
    }

    /// Index the lookups read tag documents from.
    pub fn index(&self) -> &str {
        &self.index
    }
}

impl Default for TagProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_TAG_INDEX)
    }
}

#[async_trait]
impl ClauseProcessor for TagProcessor {
    async fn process(&self, _scope: &RequestScope, args: &ClauseArgs) -> QueryResult<Value> {
        let args = TagArgs::decode(args)?;
        let lookups = args
            .tags
            .iter()
            .map(|tag| dsl::terms_lookup("id", &self.index, tag, "targets.id"));
        Ok(BoolQuery::new().should(lookups).into_value())
    }
}

/// Documentation served for the `tag` clause.
pub fn documentation() -> ClauseDocumentation {
    ClauseDocumentation::new("Searches based on a set of provided tag IDs").with_arg(
        "tags",
        "[]string",
        "The tag UUIDs to search for",
    )
}

/// Registers the base `tag` clause, reading tags from [`DEFAULT_TAG_INDEX`].
pub fn register(registry: &mut Registry) {
    registry.register(TYPE_KEY, Arc::new(TagProcessor::default()), documentation());
}
