//! Clause-tree data model and the clause processor contract.
//!
//! A search is a tree of [`GenericClause`] nodes. Each node is either a
//! [`Query`] (a boolean composition of child nodes) or a [`Clause`] (a leaf
//! naming a clause type and carrying untyped arguments).
//!
//! # JSON shape
//!
//! ```text
//! {"all": [...], "any": [...], "none": [...]}    -- Query
//! {"type": "label", "args": {"label": "foo"}}    -- Clause
//! ```
//!
//! Both shapes may appear on the same object. Decoding classifies the object
//! as a Query if any of `all`/`any`/`none` is non-empty, otherwise as a Clause
//! if `type` is non-empty, and rejects it otherwise.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{QueryError, QueryResult};
use crate::scope::RequestScope;

/// Untyped clause arguments, as received from the caller.
pub type ClauseArgs = Map<String, Value>;

/// Name identifying a clause processor within a registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ClauseType(String);

impl ClauseType {
    /// Creates a clause type from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the clause type name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the name is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ClauseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClauseType {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for ClauseType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for ClauseType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Documentation for a single clause argument.
///
/// The `type` is a short type name for clients (`string`, `[]string`,
/// `bool`); it is never checked against the actual decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseArgumentDoc {
    /// Type of the argument.
    #[serde(rename = "type")]
    pub arg_type: String,
    /// Description of the argument.
    pub summary: String,
}

impl ClauseArgumentDoc {
    /// Creates argument documentation.
    pub fn new(arg_type: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            arg_type: arg_type.into(),
            summary: summary.into(),
        }
    }
}

/// Documentation for a clause type: a summary plus per-argument docs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseDocumentation {
    /// Overall description of the clause.
    pub summary: String,
    /// Argument documentation keyed by argument name.
    pub args: BTreeMap<String, ClauseArgumentDoc>,
}

impl ClauseDocumentation {
    /// Creates documentation with no arguments.
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            args: BTreeMap::new(),
        }
    }

    /// Adds an argument.
    pub fn with_arg(
        mut self,
        name: impl Into<String>,
        arg_type: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        self.args
            .insert(name.into(), ClauseArgumentDoc::new(arg_type, summary));
        self
    }
}

/// Translates the arguments of one clause type into a query fragment.
///
/// Implementations must not hold shared mutable state: the same processor is
/// invoked concurrently for sibling clauses and for concurrent requests.
#[async_trait]
pub trait ClauseProcessor: Send + Sync {
    /// Decodes and validates `args`, returning one compiled fragment.
    async fn process(&self, scope: &RequestScope, args: &ClauseArgs) -> QueryResult<Value>;
}

/// Renders a clause as a short human-readable string.
pub trait ClauseSummarizer: Send + Sync {
    /// Summarizes `args`, failing under the same conditions as the processor.
    fn summarize(&self, args: &ClauseArgs) -> QueryResult<String>;
}

/// Decodes untyped arguments into a processor's argument struct.
///
/// Decoding is loose: unknown keys are ignored and `null` values are treated
/// as absent. Type mismatches fail with [`QueryError::Decode`].
pub fn decode_args<T: DeserializeOwned>(clause_type: &str, args: &ClauseArgs) -> QueryResult<T> {
    let present: Map<String, Value> = args
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    serde_json::from_value(Value::Object(present)).map_err(|e| QueryError::Decode {
        clause_type: clause_type.into(),
        message: e.to_string(),
    })
}

/// A leaf clause: a clause type and its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Clause {
    /// The clause type used to find a processor.
    #[serde(rename = "type")]
    pub clause_type: ClauseType,
    /// Arguments passed to the processor.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub args: ClauseArgs,
}

impl Clause {
    /// Creates a clause from a type name and a JSON object of arguments.
    ///
    /// Non-object `args` values produce an empty argument map.
    pub fn new(clause_type: impl Into<ClauseType>, args: Value) -> Self {
        let args = match args {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            clause_type: clause_type.into(),
            args,
        }
    }
}

/// A boolean composition of clauses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Query {
    /// Every clause must match.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all: Vec<GenericClause>,
    /// At least one clause must match.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub any: Vec<GenericClause>,
    /// No clause may match.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub none: Vec<GenericClause>,
}

impl Query {
    /// Returns true if all three lists are empty.
    pub fn is_empty(&self) -> bool {
        self.all.is_empty() && self.any.is_empty() && self.none.is_empty()
    }

    /// Adds a clause to `all`.
    pub fn with_all(mut self, clause: impl Into<GenericClause>) -> Self {
        self.all.push(clause.into());
        self
    }

    /// Adds a clause to `any`.
    pub fn with_any(mut self, clause: impl Into<GenericClause>) -> Self {
        self.any.push(clause.into());
        self
    }

    /// Adds a clause to `none`.
    pub fn with_none(mut self, clause: impl Into<GenericClause>) -> Self {
        self.none.push(clause.into());
        self
    }

    fn children(&self) -> impl Iterator<Item = &GenericClause> {
        self.all.iter().chain(&self.any).chain(&self.none)
    }
}

/// A node of the clause tree: either a nested [`Query`] or a leaf [`Clause`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GenericClause {
    /// A nested boolean query.
    Query(Query),
    /// A leaf clause.
    Clause(Clause),
}

impl GenericClause {
    /// Returns true if this node is a Query.
    pub fn is_query(&self) -> bool {
        matches!(self, GenericClause::Query(_))
    }

    /// Returns true if this node is a Clause.
    pub fn is_clause(&self) -> bool {
        matches!(self, GenericClause::Clause(_))
    }

    /// Counts every node in the tree, Queries and Clauses alike.
    pub fn node_count(&self) -> usize {
        match self {
            GenericClause::Clause(_) => 1,
            GenericClause::Query(q) => 1 + q.children().map(GenericClause::node_count).sum::<usize>(),
        }
    }

    /// Returns the depth of the tree; a lone Clause has depth 1.
    pub fn depth(&self) -> usize {
        match self {
            GenericClause::Clause(_) => 1,
            GenericClause::Query(q) => 1 + q.children().map(GenericClause::depth).max().unwrap_or(0),
        }
    }

    /// Adds a clause to the top-level `all` list.
    ///
    /// A top-level Clause is first wrapped in a Query so the result requires
    /// both the original clause and the new one.
    pub fn push_all(self, clause: impl Into<GenericClause>) -> Self {
        match self {
            GenericClause::Query(q) => GenericClause::Query(q.with_all(clause)),
            leaf @ GenericClause::Clause(_) => {
                GenericClause::Query(Query::default().with_all(leaf).with_all(clause))
            }
        }
    }
}

impl From<Query> for GenericClause {
    fn from(query: Query) -> Self {
        GenericClause::Query(query)
    }
}

impl From<Clause> for GenericClause {
    fn from(clause: Clause) -> Self {
        GenericClause::Clause(clause)
    }
}

/// Wire shape carrying both variants' fields before classification.
#[derive(Deserialize)]
struct RawGenericClause {
    #[serde(default)]
    all: Option<Vec<GenericClause>>,
    #[serde(default)]
    any: Option<Vec<GenericClause>>,
    #[serde(default)]
    none: Option<Vec<GenericClause>>,
    #[serde(default, rename = "type")]
    clause_type: Option<ClauseType>,
    #[serde(default)]
    args: Option<ClauseArgs>,
}

impl RawGenericClause {
    fn classify(self) -> Result<GenericClause, String> {
        // A null list decodes like a missing one.
        let all = self.all.unwrap_or_default();
        let any = self.any.unwrap_or_default();
        let none = self.none.unwrap_or_default();
        if !all.is_empty() || !any.is_empty() || !none.is_empty() {
            return Ok(GenericClause::Query(Query { all, any, none }));
        }

        match self.clause_type {
            Some(clause_type) if !clause_type.is_empty() => Ok(GenericClause::Clause(Clause {
                clause_type,
                args: self.args.unwrap_or_default(),
            })),
            _ => Err("GenericClause is neither a properly-formatted Query nor a Clause".to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for GenericClause {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawGenericClause::deserialize(deserializer)?
            .classify()
            .map_err(serde::de::Error::custom)
    }
}

/// Parses a clause tree from JSON, mapping failures to [`QueryError::InvalidTree`].
pub fn parse_tree(value: Value) -> QueryResult<GenericClause> {
    serde_json::from_value(value).map_err(|e| QueryError::InvalidTree {
        message: e.to_string(),
    })
}
