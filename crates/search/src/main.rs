//! CyVerse data search service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use cyverse_querydsl::executor::elasticsearch::ElasticsearchExecutor;
use cyverse_querydsl::sort::SortFields;
use cyverse_search::identity::DataInfoResolver;
use cyverse_search::{ServerConfig, create_app_with_sort_fields, init_logging};
use tracing::{info, warn};

/// Loads the sort field allow-list, falling back to the default one.
fn load_sort_fields(config: &ServerConfig) -> anyhow::Result<SortFields> {
    let Some(path) = &config.sort_fields else {
        return Ok(SortFields::default());
    };

    info!(path = %path.display(), "Loading sort fields");
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read sort fields from {}", path.display()))?;
    SortFields::from_json(&contents)
        .with_context(|| format!("invalid sort fields in {}", path.display()))
}

/// Starts the Axum HTTP server.
async fn serve(app: axum::Router, config: &ServerConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr();
    info!(address = %addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    init_logging(&config.log_level, config.log_format);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(
        port = config.port,
        host = %config.host,
        elasticsearch = %config.elasticsearch_base,
        index = %config.elasticsearch_index,
        "Starting search service"
    );

    let sort_fields = load_sort_fields(&config)?;

    let executor = ElasticsearchExecutor::new(config.elasticsearch_config())
        .map_err(|e| anyhow::anyhow!("Failed to create Elasticsearch executor: {}", e))?;
    if let Err(e) = executor.wait_for_yellow("30s").await {
        warn!(error = %e, "Elasticsearch is not healthy yet; continuing");
    }

    let resolver = DataInfoResolver::new(
        config.data_info_base.clone(),
        Duration::from_secs(config.request_timeout),
    )
    .map_err(|e| anyhow::anyhow!("Failed to create identity resolver: {}", e))?;

    let app = create_app_with_sort_fields(
        Arc::new(executor),
        Arc::new(resolver),
        sort_fields,
        config.clone(),
    );
    serve(app, &config).await
}
