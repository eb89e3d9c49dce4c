//! Date-range clauses over an epoch-millisecond field.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::utils::{date_to_epoch_ms, parse_bounds, range_query};
use crate::clause::{ClauseArgs, ClauseDocumentation, ClauseProcessor, ClauseSummarizer, decode_args};
use crate::error::{QueryError, QueryResult};
use crate::scope::RequestScope;

const BOUND_FORMAT: &str = "Pass as a string, milliseconds since epoch or in YYYY-MM-DDTHH:MM:SS.mss<TZ> format, where TZ can either be 'Z' or an offset in ±hh:mm format, or YYYY-MM-DD which assumes UTC and 0 values for all other fields.";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DateRangeArgs {
    from: String,
    to: String,
}

/// Inclusive date range on one document field.
#[derive(Debug, Clone, Copy)]
pub struct DateRangeProcessor {
    clause_type: &'static str,
    field: &'static str,
}

impl DateRangeProcessor {
    /// Creates a processor for `clause_type` ranging over `field`.
    pub const fn new(clause_type: &'static str, field: &'static str) -> Self {
        Self { clause_type, field }
    }

    /// Returns the document field this clause ranges over.
    pub fn field(&self) -> &'static str {
        self.field
    }
}

#[async_trait]
impl ClauseProcessor for DateRangeProcessor {
    async fn process(&self, _scope: &RequestScope, args: &ClauseArgs) -> QueryResult<Value> {
        let args: DateRangeArgs = decode_args(self.clause_type, args)?;
        let (lower, upper) = parse_bounds(self.clause_type, &args.from, &args.to, date_to_epoch_ms)?;
        Ok(range_query(self.field, lower, upper))
    }
}

impl ClauseSummarizer for DateRangeProcessor {
    fn summarize(&self, args: &ClauseArgs) -> QueryResult<String> {
        let args: DateRangeArgs = decode_args(self.clause_type, args)?;
        if args.from.is_empty() && args.to.is_empty() {
            return Err(QueryError::validation(
                self.clause_type,
                "neither from nor to was passed, cannot create clause",
            ));
        }
        Ok(format!("{}={}--{}", self.clause_type, args.from, args.to))
    }
}

/// Documentation for a date-range clause described by `summary`.
pub(crate) fn documentation(summary: &str) -> ClauseDocumentation {
    ClauseDocumentation::new(summary)
        .with_arg(
            "from",
            "string",
            format!("The start date for the range (inclusive). {}", BOUND_FORMAT),
        )
        .with_arg(
            "to",
            "string",
            format!("The end date for the range (inclusive). {}", BOUND_FORMAT),
        )
}
