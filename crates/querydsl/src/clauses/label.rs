//! `label` clause: matches an object's label, typically its file name.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::utils::add_implicit_wildcard;
use crate::clause::{ClauseArgs, ClauseDocumentation, ClauseProcessor, decode_args};
use crate::dsl;
use crate::error::{QueryError, QueryResult};
use crate::registry::Registry;
use crate::scope::RequestScope;

/// Registry key of this clause.
pub const TYPE_KEY: &str = "label";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LabelArgs {
    label: String,
    exact: bool,
}

/// Compiles to a `query_string` query on the `label` field.
#[derive(Debug, Default, Clone, Copy)]
pub struct LabelProcessor;

#[async_trait]
impl ClauseProcessor for LabelProcessor {
    async fn process(&self, _scope: &RequestScope, args: &ClauseArgs) -> QueryResult<Value> {
        let args: LabelArgs = decode_args(TYPE_KEY, args)?;
        if args.label.is_empty() {
            return Err(QueryError::validation(
                TYPE_KEY,
                "no label was passed, cannot create clause",
            ));
        }

        let processed = if args.exact {
            args.label
        } else {
            add_implicit_wildcard(&args.label)
        };
        Ok(dsl::query_string("label", &processed))
    }
}

/// Documentation served for the `label` clause.
pub fn documentation() -> ClauseDocumentation {
    ClauseDocumentation::new("Searches based on an object's label (typically, its filename)")
        .with_arg("label", "string", "The label to search for")
        .with_arg(
            "exact",
            "bool",
            "Whether to search more precisely, or whether the query should be processed to add wildcards",
        )
}

/// Registers the `label` clause.
pub fn register(registry: &mut Registry) {
    registry.register(TYPE_KEY, Arc::new(LabelProcessor), documentation());
}
