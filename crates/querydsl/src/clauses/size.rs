//! `size` clause: matches a file's size in bytes.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::utils::{parse_bounds, range_query, string_to_filesize};
use crate::clause::{ClauseArgs, ClauseDocumentation, ClauseProcessor, decode_args};
use crate::error::QueryResult;
use crate::registry::Registry;
use crate::scope::RequestScope;

/// Registry key of this clause.
pub const TYPE_KEY: &str = "size";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SizeArgs {
    from: String,
    to: String,
}

/// Compiles to an inclusive range on `fileSize`. Folders carry no size, so
/// only files can match.
#[derive(Debug, Default, Clone, Copy)]
pub struct SizeProcessor;

#[async_trait]
impl ClauseProcessor for SizeProcessor {
    async fn process(&self, _scope: &RequestScope, args: &ClauseArgs) -> QueryResult<Value> {
        let args: SizeArgs = decode_args(TYPE_KEY, args)?;
        let (lower, upper) = parse_bounds(TYPE_KEY, &args.from, &args.to, string_to_filesize)?;
        Ok(range_query("fileSize", lower, upper))
    }
}

/// Documentation served for the `size` clause.
pub fn documentation() -> ClauseDocumentation {
    ClauseDocumentation::new(
        "Searches based on an object's file size. Searches matching this clause will only include files, as folders do not store a size.",
    )
    .with_arg(
        "from",
        "string",
        "The lower end of the range (inclusive). Pass as a string, either a number of bytes or a number followed by optional whitespace and then one of 'KB', 'MB', 'GB', or 'TB', which refer to powers of 1024 bytes (commonly called kilo/mebi/gibi/tebibytes).",
    )
    .with_arg(
        "to",
        "string",
        "The upper end of the range (inclusive). Pass as a string, as with 'from'.",
    )
}

/// Registers the `size` clause.
pub fn register(registry: &mut Registry) {
    registry.register(TYPE_KEY, Arc::new(SizeProcessor), documentation());
}
