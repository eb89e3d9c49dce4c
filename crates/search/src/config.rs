//! Service configuration.
//!
//! Every option can be given on the command line or through the environment.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SEARCH_SERVER_PORT` | 60000 | Server port |
//! | `SEARCH_SERVER_HOST` | 0.0.0.0 | Host to bind |
//! | `SEARCH_LOG_LEVEL` | info | Log level |
//! | `SEARCH_LOG_FORMAT` | json | `json` or `text` |
//! | `SEARCH_ELASTICSEARCH_BASE` | http://localhost:9200 | Elasticsearch node |
//! | `SEARCH_ELASTICSEARCH_USER` | | Basic auth user |
//! | `SEARCH_ELASTICSEARCH_PASSWORD` | | Basic auth password |
//! | `SEARCH_ELASTICSEARCH_INDEX` | data | Data document index |
//! | `SEARCH_ELASTICSEARCH_TAG_INDEX` | | Tag document index (data index when unset) |
//! | `SEARCH_DATA_INFO_BASE` | http://data-info | Identity service base URL |
//! | `SEARCH_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `SEARCH_DEFAULT_PAGE_SIZE` | 10 | Page size when a search gives none |
//! | `SEARCH_MAX_CLAUSE_COUNT` | 500 | Maximum nodes in a clause tree |
//! | `SEARCH_MAX_CLAUSE_DEPTH` | 16 | Maximum clause tree depth |
//! | `SEARCH_SORT_FIELDS` | | JSON file replacing the sort field allow-list |

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use cyverse_querydsl::executor::elasticsearch::{ElasticsearchAuth, ElasticsearchConfig};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable lines.
    Text,
}

/// Search service configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "search")]
#[command(about = "CyVerse data search service")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(short, long, env = "SEARCH_SERVER_PORT", default_value = "60000")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "SEARCH_SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "SEARCH_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format.
    #[arg(long, env = "SEARCH_LOG_FORMAT", value_enum, default_value = "json")]
    pub log_format: LogFormat,

    /// Elasticsearch base URL.
    #[arg(long, env = "SEARCH_ELASTICSEARCH_BASE", default_value = "http://localhost:9200")]
    pub elasticsearch_base: String,

    /// Elasticsearch user for basic auth.
    #[arg(long, env = "SEARCH_ELASTICSEARCH_USER")]
    pub elasticsearch_user: Option<String>,

    /// Elasticsearch password for basic auth.
    #[arg(long, env = "SEARCH_ELASTICSEARCH_PASSWORD")]
    pub elasticsearch_password: Option<String>,

    /// Index holding file and folder documents.
    #[arg(long, env = "SEARCH_ELASTICSEARCH_INDEX", default_value = "data")]
    pub elasticsearch_index: String,

    /// Index holding tag documents.
    #[arg(long, env = "SEARCH_ELASTICSEARCH_TAG_INDEX")]
    pub elasticsearch_tag_index: Option<String>,

    /// Base URL of the data-info service used for identity lookups.
    #[arg(long, env = "SEARCH_DATA_INFO_BASE", default_value = "http://data-info")]
    pub data_info_base: String,

    /// Request timeout in seconds; also bounds query compilation.
    #[arg(long, env = "SEARCH_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Page size used when a search does not give one.
    #[arg(long, env = "SEARCH_DEFAULT_PAGE_SIZE", default_value = "10")]
    pub default_page_size: usize,

    /// Maximum number of nodes in a clause tree.
    #[arg(long, env = "SEARCH_MAX_CLAUSE_COUNT", default_value = "500")]
    pub max_clause_count: usize,

    /// Maximum depth of a clause tree.
    #[arg(long, env = "SEARCH_MAX_CLAUSE_DEPTH", default_value = "16")]
    pub max_clause_depth: usize,

    /// JSON file mapping logical sort field names to index fields.
    #[arg(long, env = "SEARCH_SORT_FIELDS")]
    pub sort_fields: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 60000,
            host: "0.0.0.0".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            elasticsearch_base: "http://localhost:9200".to_string(),
            elasticsearch_user: None,
            elasticsearch_password: None,
            elasticsearch_index: "data".to_string(),
            elasticsearch_tag_index: None,
            data_info_base: "http://data-info".to_string(),
            request_timeout: 30,
            default_page_size: 10,
            max_clause_count: 500,
            max_clause_depth: 16,
            sort_fields: None,
        }
    }
}

impl ServerConfig {
    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the index tag documents live in; the data index when unset.
    pub fn tag_index(&self) -> &str {
        self.elasticsearch_tag_index
            .as_deref()
            .unwrap_or(&self.elasticsearch_index)
    }

    /// Builds the Elasticsearch executor configuration.
    pub fn elasticsearch_config(&self) -> ElasticsearchConfig {
        let auth = match (&self.elasticsearch_user, &self.elasticsearch_password) {
            (Some(username), Some(password)) => Some(ElasticsearchAuth::Basic {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        };

        ElasticsearchConfig {
            base_url: self.elasticsearch_base.clone(),
            index: self.elasticsearch_index.clone(),
            tag_index: self.elasticsearch_tag_index.clone(),
            request_timeout_ms: self.request_timeout.saturating_mul(1000),
            auth,
            ..Default::default()
        }
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push("Port cannot be 0".to_string());
        }

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if self.default_page_size == 0 {
            errors.push("Default page size cannot be 0".to_string());
        }

        if self.max_clause_count == 0 {
            errors.push("Max clause count cannot be 0".to_string());
        }

        if self.max_clause_depth == 0 {
            errors.push("Max clause depth cannot be 0".to_string());
        }

        if self.elasticsearch_user.is_some() != self.elasticsearch_password.is_some() {
            errors.push(
                "Elasticsearch user and password must be given together".to_string(),
            );
        }

        for (name, value) in [
            ("Elasticsearch base", &self.elasticsearch_base),
            ("Data-info base", &self.data_info_base),
        ] {
            if url::Url::parse(value).is_err() {
                errors.push(format!("{} is not a valid URL: {}", name, value));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    pub fn for_testing() -> Self {
        Self {
            port: 0,
            host: "127.0.0.1".to_string(),
            log_level: "debug".to_string(),
            log_format: LogFormat::Text,
            request_timeout: 5,
            ..Default::default()
        }
    }
}
