//! `owner` clause: matches objects owned by a user.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::utils::add_implicit_username_wildcard;
use crate::clause::{ClauseArgs, ClauseDocumentation, ClauseProcessor, decode_args};
use crate::dsl::{self, BoolQuery};
use crate::error::{QueryError, QueryResult};
use crate::registry::Registry;
use crate::scope::RequestScope;

/// Registry key of this clause.
pub const TYPE_KEY: &str = "owner";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwnerArgs {
    owner: String,
}

/// Compiles to a nested `userPermissions` query requiring `own` permission.
#[derive(Debug, Default, Clone, Copy)]
pub struct OwnerProcessor;

#[async_trait]
impl ClauseProcessor for OwnerProcessor {
    async fn process(&self, _scope: &RequestScope, args: &ClauseArgs) -> QueryResult<Value> {
        let args: OwnerArgs = decode_args(TYPE_KEY, args)?;
        if args.owner.is_empty() {
            return Err(QueryError::validation(
                TYPE_KEY,
                "no owner was passed, cannot create clause",
            ));
        }

        let owner = add_implicit_username_wildcard(&args.owner);
        let inner = BoolQuery::new()
            .must(dsl::term("userPermissions.permission", "own"))
            .must(dsl::wildcard("userPermissions.user", &owner));
        Ok(dsl::nested("userPermissions", inner.into_value()))
    }
}

/// Documentation served for the `owner` clause.
pub fn documentation() -> ClauseDocumentation {
    ClauseDocumentation::new("Searches based on an object's owner(s)").with_arg(
        "owner",
        "string",
        "The owner to search for. If it includes a # character, it will be searched exactly, otherwise the zone will be wildcarded.",
    )
}

/// Registers the `owner` clause.
pub fn register(registry: &mut Registry) {
    registry.register(TYPE_KEY, Arc::new(OwnerProcessor), documentation());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn run(args: Value) -> QueryResult<Value> {
        OwnerProcessor
            .process(&RequestScope::new(), args.as_object().unwrap())
            .await
    }

    #[tokio::test]
    async fn test_unqualified_owner_gets_zone_wildcard() {
        let out = run(json!({"owner": "ipcdev"})).await.unwrap();
        assert_eq!(
            out,
            json!({"nested": {
                "path": "userPermissions",
                "query": {"bool": {"must": [
                    {"term": {"userPermissions.permission": "own"}},
                    {"wildcard": {"userPermissions.user": "ipcdev#*"}}
                ]}}
            }})
        );
    }

    #[tokio::test]
    async fn test_qualified_owner_kept() {
        let out = run(json!({"owner": "ipcdev#iplant"})).await.unwrap();
        assert_eq!(
            out["nested"]["query"]["bool"]["must"][1],
            json!({"wildcard": {"userPermissions.user": "ipcdev#iplant"}})
        );
    }

    #[tokio::test]
    async fn test_owner_required() {
        assert!(run(json!({})).await.is_err());
    }
}
