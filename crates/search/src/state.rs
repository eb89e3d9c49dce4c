//! Application state shared by every request handler.

use std::sync::Arc;

use cyverse_querydsl::executor::IndexExecutor;
use cyverse_querydsl::identity::IdentityResolver;
use cyverse_querydsl::sort::SortFields;
use cyverse_querydsl::translate::Translator;

use crate::config::ServerConfig;

/// Shared application state for the search service.
///
/// The translator, executor and resolver are built once at startup and shared
/// by every in-flight request.
pub struct AppState {
    translator: Translator,
    executor: Arc<dyn IndexExecutor>,
    resolver: Arc<dyn IdentityResolver>,
    sort_fields: Arc<SortFields>,
    config: Arc<ServerConfig>,
}

// Manual Clone so the trait objects only need to be behind an Arc
impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            translator: self.translator.clone(),
            executor: Arc::clone(&self.executor),
            resolver: Arc::clone(&self.resolver),
            sort_fields: Arc::clone(&self.sort_fields),
            config: Arc::clone(&self.config),
        }
    }
}

impl AppState {
    /// Creates the state from its collaborators.
    pub fn new(
        translator: Translator,
        executor: Arc<dyn IndexExecutor>,
        resolver: Arc<dyn IdentityResolver>,
        sort_fields: SortFields,
        config: ServerConfig,
    ) -> Self {
        Self {
            translator,
            executor,
            resolver,
            sort_fields: Arc::new(sort_fields),
            config: Arc::new(config),
        }
    }

    /// Returns the clause-tree translator.
    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Returns the index executor.
    pub fn executor(&self) -> &Arc<dyn IndexExecutor> {
        &self.executor
    }

    /// Returns the identity resolver.
    pub fn resolver(&self) -> &dyn IdentityResolver {
        self.resolver.as_ref()
    }

    /// Returns the sort field allow-list.
    pub fn sort_fields(&self) -> &SortFields {
        &self.sort_fields
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
