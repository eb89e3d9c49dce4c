//! CyVerse data search query DSL
//!
//! This crate compiles clause trees, nested boolean compositions of typed
//! search clauses, into Elasticsearch Query DSL.
//!
//! # Architecture
//!
//! - [`clause`] - Clause-tree data model and the processor contract
//! - [`registry`] - Clause type registry with self-describing documentation
//! - [`translate`] - Concurrent tree-to-query translation
//! - [`clauses`] - Built-in clause processors (label, path, owner, ...)
//! - [`dsl`] - Query DSL primitives the processors build from
//! - [`scope`] - Per-request capabilities passed to processors
//! - [`executor`] - Index execution contract (Elasticsearch behind a feature)
//! - [`identity`] - Acting-user identity and its resolver contract
//! - [`sort`] - Sort field allow-list
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use cyverse_querydsl::{RequestScope, Registry, Translator, parse_tree};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let translator = Translator::new(Arc::new(Registry::with_builtin_clauses()));
//!
//! let tree = parse_tree(json!({
//!     "all": [{"type": "label", "args": {"label": "reads", "exact": true}}],
//!     "none": [{"type": "path", "args": {"prefix": "/iplant/trash"}}]
//! }))
//! .unwrap();
//!
//! let query = translator.translate(&RequestScope::new(), tree).await.unwrap();
//! assert_eq!(
//!     query,
//!     json!({"bool": {
//!         "must": [{"query_string": {"query": "reads", "fields": ["label"]}}],
//!         "must_not": [{"prefix": {"path": "/iplant/trash"}}]
//!     }})
//! );
//! # });
//! ```
//!
//! # Custom clause types
//!
//! Anything implementing [`ClauseProcessor`] can be registered. Registering
//! an existing type replaces it; the search service uses this to swap in
//! [`clauses::owned_tag::OwnedTagProcessor`] for `tag`.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod clause;
pub mod clauses;
pub mod dsl;
pub mod error;
pub mod executor;
pub mod identity;
pub mod registry;
pub mod scope;
pub mod sort;
pub mod translate;

pub use clause::{
    Clause, ClauseArgs, ClauseDocumentation, ClauseProcessor, ClauseSummarizer, ClauseType,
    GenericClause, Query, parse_tree,
};
pub use error::{BackendError, ErrorClass, QueryError, QueryResult};
pub use executor::{DocumentKind, IndexExecutor};
pub use identity::{Identity, IdentityError, IdentityResolver};
pub use registry::Registry;
pub use scope::RequestScope;
pub use sort::{SortFields, SortSpec};
pub use translate::Translator;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
