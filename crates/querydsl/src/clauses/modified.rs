//! `modified` clause: matches an object's last modification date.

use std::sync::Arc;

use super::date_range::{self, DateRangeProcessor};
use crate::clause::ClauseDocumentation;
use crate::registry::Registry;

/// Registry key of this clause.
pub const TYPE_KEY: &str = "modified";

/// Ranges over `dateModified`.
pub const PROCESSOR: DateRangeProcessor = DateRangeProcessor::new(TYPE_KEY, "dateModified");

/// Documentation served for the `modified` clause.
pub fn documentation() -> ClauseDocumentation {
    date_range::documentation("Searches based on an object's last-modified date")
}

/// Registers the `modified` clause with its summarizer.
pub fn register(registry: &mut Registry) {
    registry.register_summarized(
        TYPE_KEY,
        Arc::new(PROCESSOR),
        documentation(),
        Arc::new(PROCESSOR),
    );
}
