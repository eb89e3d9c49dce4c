//! # cyverse-search - Data search service
//!
//! HTTP service that accepts clause-tree searches, compiles them with
//! [`cyverse_querydsl`] and runs them against Elasticsearch on behalf of a
//! user.
//!
//! ## API Endpoints
//!
//! | Interaction | HTTP Method | URL Pattern |
//! |------------|-------------|-------------|
//! | health | GET | `/` |
//! | clause documentation | GET | `/data/documentation` |
//! | search | POST | `/data/search?user=<name>` |
//! | scroll | POST | `/data/scroll` |
//!
//! Every search is restricted to documents the acting user (or one of its
//! groups) can read: a `permissions` clause is appended to the top-level
//! `all` of the submitted tree before compilation.
//!
//! ## Architecture
//!
//! - [`config`] - Server configuration
//! - [`error`] - Error types and their HTTP rendering
//! - [`state`] - Application state (translator, executor, resolver)
//! - [`identity`] - data-info identity resolver
//! - [`handlers`] - HTTP request handlers
//! - [`routing`] - Route configuration

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod routing;
pub mod state;

pub use config::{LogFormat, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use state::AppState;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, StatusCode};
use cyverse_querydsl::clauses::owned_tag;
use cyverse_querydsl::executor::IndexExecutor;
use cyverse_querydsl::identity::IdentityResolver;
use cyverse_querydsl::registry::Registry;
use cyverse_querydsl::sort::SortFields;
use cyverse_querydsl::translate::Translator;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::handlers::search::REQUEST_ID_HEADER;

/// Builds the clause registry the service compiles with.
///
/// This is the builtin registry with `tag` replaced by the ownership-checking
/// processor, whose lookups read tags from `tag_index`.
pub fn build_registry(tag_index: &str) -> Registry {
    let mut registry = Registry::with_builtin_clauses();
    owned_tag::register(&mut registry, tag_index);
    registry
}

/// Creates the Axum application with the default sort fields.
pub fn create_app(
    executor: Arc<dyn IndexExecutor>,
    resolver: Arc<dyn IdentityResolver>,
    config: ServerConfig,
) -> Router {
    create_app_with_sort_fields(executor, resolver, SortFields::default(), config)
}

/// Creates the Axum application with a custom sort field allow-list.
pub fn create_app_with_sort_fields(
    executor: Arc<dyn IndexExecutor>,
    resolver: Arc<dyn IdentityResolver>,
    sort_fields: SortFields,
    config: ServerConfig,
) -> Router {
    let registry = build_registry(config.tag_index());
    info!(
        clause_types = registry.len(),
        tag_index = config.tag_index(),
        "Creating search service"
    );

    let translator = Translator::new(Arc::new(registry));
    let state = AppState::new(translator, executor, resolver, sort_fields, config);
    create_app_with_state(state)
}

/// Creates the Axum application from prepared state.
pub fn create_app_with_state(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config().request_timeout);
    let router = routing::create_routes(state);
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let service_builder = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ));

    router.layer(build_cors_layer()).layer(service_builder)
}

/// Builds the CORS layer.
fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup. `RUST_LOG` overrides
/// `level` when set.
pub fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "cyverse_search={level},cyverse_querydsl={level},tower_http=debug"
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Text => registry.with(fmt::layer()).init(),
    }
}
