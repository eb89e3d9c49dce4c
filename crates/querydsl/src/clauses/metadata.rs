//! `metadata` clause: matches attribute/value/unit triples attached to an
//! object, either as iRODS AVUs on the object itself or as CyVerse metadata
//! stored in child documents.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::utils::add_implicit_wildcard;
use crate::clause::{ClauseArgs, ClauseDocumentation, ClauseProcessor, decode_args};
use crate::dsl::{self, BoolQuery};
use crate::error::{QueryError, QueryResult};
use crate::registry::Registry;
use crate::scope::RequestScope;

/// Registry key of this clause.
pub const TYPE_KEY: &str = "metadata";

const FILE_METADATA: &str = "file_metadata";
const FOLDER_METADATA: &str = "folder_metadata";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MetadataArgs {
    attribute: String,
    value: String,
    unit: String,
    metadata_types: Vec<String>,
    attribute_exact: bool,
    value_exact: bool,
    unit_exact: bool,
}

#[derive(Debug, Default)]
struct MetadataSources {
    irods: bool,
    cyverse: bool,
}

impl MetadataSources {
    fn parse(types: &[String]) -> QueryResult<Self> {
        if types.is_empty() {
            return Ok(Self {
                irods: true,
                cyverse: true,
            });
        }

        let mut sources = Self::default();
        for t in types {
            match t.as_str() {
                "irods" => sources.irods = true,
                "cyverse" => sources.cyverse = true,
                other => {
                    return Err(QueryError::validation(
                        TYPE_KEY,
                        format!("got a metadata type of {:?}, but expected irods or cyverse", other),
                    ));
                }
            }
        }
        Ok(sources)
    }
}

fn prepare(text: &str, exact: bool) -> String {
    if exact {
        text.to_string()
    } else {
        add_implicit_wildcard(text)
    }
}

/// Nested query over `metadata` requiring each non-blank part to match.
fn nested_avu(attribute: &str, value: &str, unit: &str) -> Value {
    let inner = [
        ("metadata.attribute", attribute),
        ("metadata.value", value),
        ("metadata.unit", unit),
    ]
    .into_iter()
    .filter(|(_, text)| !text.is_empty())
    .fold(BoolQuery::new(), |q, (field, text)| {
        q.must(dsl::query_string(field, text))
    });
    dsl::nested("metadata", inner.into_value())
}

/// Compiles to a `bool` of alternatives, one per requested metadata source.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetadataProcessor;

#[async_trait]
impl ClauseProcessor for MetadataProcessor {
    async fn process(&self, _scope: &RequestScope, args: &ClauseArgs) -> QueryResult<Value> {
        let args: MetadataArgs = decode_args(TYPE_KEY, args)?;
        if args.attribute.is_empty() && args.value.is_empty() && args.unit.is_empty() {
            return Err(QueryError::validation(
                TYPE_KEY,
                "must provide at least one of attribute, value, or unit",
            ));
        }
        let sources = MetadataSources::parse(&args.metadata_types)?;

        let attribute = prepare(&args.attribute, args.attribute_exact);
        let value = prepare(&args.value, args.value_exact);
        let unit = prepare(&args.unit, args.unit_exact);

        let mut alternatives = Vec::with_capacity(3);
        if sources.irods {
            alternatives.push(nested_avu(&attribute, &value, &unit));
        }
        if sources.cyverse {
            for child_type in [FILE_METADATA, FOLDER_METADATA] {
                alternatives.push(dsl::has_child(
                    child_type,
                    nested_avu(&attribute, &value, &unit),
                ));
            }
        }

        Ok(BoolQuery::new().should(alternatives).into_value())
    }
}

/// Documentation served for the `metadata` clause.
pub fn documentation() -> ClauseDocumentation {
    ClauseDocumentation::new(
        "Searches based on the metadata associated with an object. At least one of attribute, value, or unit should be non-blank.",
    )
    .with_arg("attribute", "string", "The AVU's attribute field")
    .with_arg("value", "string", "The AVU's value field")
    .with_arg("unit", "string", "The AVU's unit field")
    .with_arg(
        "metadata_types",
        "[]string",
        "What types of metadata to search. Can include 'irods', 'cyverse', or blank for both types.",
    )
    .with_arg(
        "attribute_exact",
        "bool",
        "Whether to search the attribute exactly, or add implicit wildcards",
    )
    .with_arg(
        "value_exact",
        "bool",
        "Whether to search the value exactly, or add implicit wildcards",
    )
    .with_arg(
        "unit_exact",
        "bool",
        "Whether to search the unit exactly, or add implicit wildcards",
    )
}

/// Registers the `metadata` clause.
pub fn register(registry: &mut Registry) {
    registry.register(TYPE_KEY, Arc::new(MetadataProcessor), documentation());
}
