//! `permissions` clause: matches objects on which any of a set of users holds
//! a given permission.

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
pub const TYPE_KEY: &str = "permissions";

const PERMISSION_FIELD: &str = "userPermissions.permission";
const USER_FIELD: &str = "userPermissions.user";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PermissionsArgs {
    users: Vec<String>,
    permission: String,
    permission_recurse: bool,
    exact: bool,
}

/// Permission levels, each implying the ones below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Permission {
    Read,
    Write,
    Own,
}

impl Permission {
    fn parse(value: &str) -> QueryResult<Self> {
        match value {
            "read" => Ok(Permission::Read),
            "write" => Ok(Permission::Write),
            "own" => Ok(Permission::Own),
            "" => Err(QueryError::validation(
                TYPE_KEY,
                "no permission was passed, cannot create clause",
            )),
            other => Err(QueryError::validation(
                TYPE_KEY,
                format!("got a permission of {:?}, but expected read, write, or own", other),
            )),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Write => "write",
            Permission::Own => "own",
        }
    }
}

/// Compiles to a nested `userPermissions` query.
///
/// Qualified users (and every user when `exact` is set) are matched with a
/// single `terms` query; the rest get one zone wildcard each. With more than
/// one alternative, any single user matching is enough.
#[derive(Debug, Default, Clone, Copy)]
pub struct PermissionsProcessor;

#[async_trait]
impl ClauseProcessor for PermissionsProcessor {
    async fn process(&self, _scope: &RequestScope, args: &ClauseArgs) -> QueryResult<Value> {
        let args: PermissionsArgs = decode_args(TYPE_KEY, args)?;
        if args.users.is_empty() {
            return Err(QueryError::validation(
                TYPE_KEY,
                "no users were passed, cannot create clause",
            ));
        }
        let permission = Permission::parse(&args.permission)?;

        let mut exact_users: Vec<&str> = Vec::new();
        let mut wildcards: Vec<Value> = Vec::new();
        for user in &args.users {
            let processed = add_implicit_username_wildcard(user);
            if args.exact || processed == *user {
                exact_users.push(user);
            } else {
                wildcards.push(dsl::wildcard(USER_FIELD, &processed));
            }
        }

        // recursive read matches any permission at all
        let mut inner = match (args.permission_recurse, permission) {
            (true, Permission::Read) => BoolQuery::new(),
            (true, Permission::Write) => {
                BoolQuery::new().must(dsl::terms(PERMISSION_FIELD, ["write", "own"]))
            }
            _ => BoolQuery::new().must(dsl::term(PERMISSION_FIELD, permission.as_str())),
        };

        if !exact_users.is_empty() {
            let terms = dsl::terms(USER_FIELD, exact_users.iter().copied());
            inner = if wildcards.is_empty() {
                inner.must(terms)
            } else {
                inner.should([terms])
            };
        }

        if wildcards.len() == 1 && exact_users.is_empty() {
            inner = wildcards.into_iter().fold(inner, BoolQuery::must);
        } else if !wildcards.is_empty() {
            inner = inner.should(wildcards);
        }

        if inner.should_len() > 0 {
            inner = inner.minimum_should_match(1);
        }

        Ok(dsl::nested("userPermissions", inner.into_value()))
    }
}

/// Documentation served for the `permissions` clause.
pub fn documentation() -> ClauseDocumentation {
    ClauseDocumentation::new("Searches based on an object's permissions for specified users")
        .with_arg(
            "users",
            "[]string",
            "The users to search for. If a given username is not qualified (does not contain a # character), a wildcard will be added unless 'exact' is set to true.",
        )
        .with_arg(
            "permission",
            "string",
            "The permission to check for; should be one of 'own', 'write', or 'read', with own implying write implying read. To search for objects where the user has no permissions at all, use 'read' in a negation and set permission_recurse to true.",
        )
        .with_arg(
            "permission_recurse",
            "bool",
            "If set to true, 'read' permission will also match write and own, and 'write' permission will also match own.",
        )
        .with_arg(
            "exact",
            "bool",
            "If set to true, do not add implicit wildcards even to usernames without the # character. This will in general effectively ignore those arguments, but may improve performance slightly if all the usernames are already known to be qualified appropriately.",
        )
}

/// Registers the `permissions` clause.
pub fn register(registry: &mut Registry) {
    registry.register(TYPE_KEY, Arc::new(PermissionsProcessor), documentation());
}
