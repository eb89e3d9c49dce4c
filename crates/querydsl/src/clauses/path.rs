//! `path` clause: matches an object's full path by prefix.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::clause::{ClauseArgs, ClauseDocumentation, ClauseProcessor, ClauseSummarizer, decode_args};
use crate::dsl;
use crate::error::{QueryError, QueryResult};
use crate::registry::Registry;
use crate::scope::RequestScope;

/// Registry key of this clause.
pub const TYPE_KEY: &str = "path";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PathArgs {
    prefix: String,
}

impl PathArgs {
    fn decode(args: &ClauseArgs) -> QueryResult<Self> {
        let args: PathArgs = decode_args(TYPE_KEY, args)?;
        if args.prefix.is_empty() {
            return Err(QueryError::validation(
                TYPE_KEY,
                "no prefix was passed, cannot create clause",
            ));
        }
        Ok(args)
    }
}

/// Compiles to a `prefix` query on the `path` field.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathProcessor;

#[async_trait]
impl ClauseProcessor for PathProcessor {
    async fn process(&self, _scope: &RequestScope, args: &ClauseArgs) -> QueryResult<Value> {
        let args = PathArgs::decode(args)?;
        Ok(dsl::prefix("path", &args.prefix))
    }
}

impl ClauseSummarizer for PathProcessor {
    fn summarize(&self, args: &ClauseArgs) -> QueryResult<String> {
        let args = PathArgs::decode(args)?;
        Ok(format!("path=\"{}\"", args.prefix))
    }
}

/// Documentation served for the `path` clause.
pub fn documentation() -> ClauseDocumentation {
    ClauseDocumentation::new("Searches based on an object's full path")
        .with_arg("prefix", "string", "The path prefix to search for")
}

/// Registers the `path` clause with its summarizer.
pub fn register(registry: &mut Registry) {
    registry.register_summarized(
        TYPE_KEY,
        Arc::new(PathProcessor),
        documentation(),
        Arc::new(PathProcessor),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_prefix_query() {
        let args = json!({"prefix": "/iplant/home/ipcdev"});
        let out = PathProcessor
            .process(&RequestScope::new(), args.as_object().unwrap())
            .await
            .unwrap();
        assert_eq!(out, json!({"prefix": {"path": "/iplant/home/ipcdev"}}));
    }

    #[test]
    fn test_summary() {
        let args = json!({"prefix": "/iplant/home"});
        assert_eq!(
            PathProcessor.summarize(args.as_object().unwrap()).unwrap(),
            "path=\"/iplant/home\""
        );
        assert!(PathProcessor.summarize(&ClauseArgs::new()).is_err());
    }
}
