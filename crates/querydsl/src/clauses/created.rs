//! `created` clause: matches an object's creation date.

use std::sync::Arc;

use super::date_range::{self, DateRangeProcessor};
use crate::clause::ClauseDocumentation;
use crate::registry::Registry;

/// Registry key of this clause.
pub const TYPE_KEY: &str = "created";

/// Ranges over `dateCreated`.
pub const PROCESSOR: DateRangeProcessor = DateRangeProcessor::new(TYPE_KEY, "dateCreated");

/// Documentation served for the `created` clause.
pub fn documentation() -> ClauseDocumentation {
    date_range::documentation("Searches based on an object's creation date")
}

/// Registers the `created` clause with its summarizer.
pub fn register(registry: &mut Registry) {
    registry.register_summarized(
        TYPE_KEY,
        Arc::new(PROCESSOR),
        documentation(),
        Arc::new(PROCESSOR),
    );
}
