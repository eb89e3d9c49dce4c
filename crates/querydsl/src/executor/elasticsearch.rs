//! Elasticsearch-backed [`IndexExecutor`].

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use elasticsearch::auth::Credentials;
use elasticsearch::cert::CertificateValidation;
use elasticsearch::cluster::ClusterHealthParts;
use elasticsearch::http::response::Response;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::params::WaitForStatus;
use elasticsearch::{CountParts, Elasticsearch, ScrollParts, SearchParts};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{DocumentKind, ExecutorResult, IndexExecutor};
use crate::error::BackendError;

const BACKEND_NAME: &str = "elasticsearch";

/// Authentication configuration for Elasticsearch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ElasticsearchAuth {
    /// Basic username/password authentication.
    Basic {
        /// The username for basic auth.
        username: String,
        /// The password for basic auth.
        password: String,
    },
    /// Bearer token authentication.
    Bearer {
        /// The bearer token.
        token: String,
    },
}

/// Configuration for the Elasticsearch executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Elasticsearch base URL (e.g., `"http://localhost:9200"`).
    pub base_url: String,

    /// Index holding file and folder documents (default: `"data"`).
    #[serde(default = "default_index")]
    pub index: String,

    /// Index holding tag documents; the data index when unset.
    #[serde(default)]
    pub tag_index: Option<String>,

    /// Request timeout in milliseconds (default: 30000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Optional authentication.
    #[serde(default)]
    pub auth: Option<ElasticsearchAuth>,

    /// Whether to disable certificate validation (default: false).
    /// Only use for development/testing.
    #[serde(default)]
    pub disable_certificate_validation: bool,
}

fn default_index() -> String {
    "data".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30000
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9200".to_string(),
            index: default_index(),
            tag_index: None,
            request_timeout_ms: default_request_timeout_ms(),
            auth: None,
            disable_certificate_validation: false,
        }
    }
}

impl ElasticsearchConfig {
    /// Returns the index searched for documents of `kind`.
    pub fn index_for(&self, kind: DocumentKind) -> &str {
        match kind {
            DocumentKind::Data => &self.index,
            DocumentKind::Tag => self.tag_index.as_deref().unwrap_or(&self.index),
        }
    }
}

/// Runs compiled queries against an Elasticsearch cluster.
pub struct ElasticsearchExecutor {
    client: Elasticsearch,
    config: ElasticsearchConfig,
}

impl Debug for ElasticsearchExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchExecutor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ElasticsearchExecutor {
    /// Creates an executor. No connection is made until the first request.
    pub fn new(config: ElasticsearchConfig) -> ExecutorResult<Self> {
        let client = Self::build_client(&config)?;
        Ok(Self { client, config })
    }

    /// Builds the Elasticsearch client from configuration.
    fn build_client(config: &ElasticsearchConfig) -> ExecutorResult<Elasticsearch> {
        let parsed_url: elasticsearch::http::Url =
            config
                .base_url
                .parse()
                .map_err(|e| BackendError::ConnectionFailed {
                    backend_name: BACKEND_NAME.to_string(),
                    message: format!("Invalid URL: {}", e),
                })?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);

        let mut builder = TransportBuilder::new(conn_pool)
            .timeout(Duration::from_millis(config.request_timeout_ms));

        if config.disable_certificate_validation {
            builder = builder.cert_validation(CertificateValidation::None);
        }

        if let Some(ref auth) = config.auth {
            builder = match auth {
                ElasticsearchAuth::Basic { username, password } => {
                    builder.auth(Credentials::Basic(username.clone(), password.clone()))
                }
                ElasticsearchAuth::Bearer { token } => {
                    builder.auth(Credentials::Bearer(token.clone()))
                }
            };
        }

        let transport = builder.build().map_err(|e| BackendError::ConnectionFailed {
            backend_name: BACKEND_NAME.to_string(),
            message: format!("Failed to build transport: {}", e),
        })?;

        Ok(Elasticsearch::new(transport))
    }

    /// Returns the executor configuration.
    pub fn config(&self) -> &ElasticsearchConfig {
        &self.config
    }

    /// Waits up to `wait` for the cluster to report yellow or better health.
    pub async fn wait_for_yellow(&self, wait: &str) -> ExecutorResult<()> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .wait_for_status(WaitForStatus::Yellow)
            .timeout(wait)
            .send()
            .await
            .map_err(|e| transport_error("health check", e))?;

        let body = read_json("health check", response).await?;
        if body.get("timed_out").and_then(Value::as_bool).unwrap_or(false) {
            return Err(BackendError::ConnectionFailed {
                backend_name: BACKEND_NAME.to_string(),
                message: format!("Cluster did not report yellow or better status within {}", wait),
            });
        }

        tracing::info!(
            status = body.get("status").and_then(serde_json::Value::as_str).unwrap_or("unknown"),
            "Elasticsearch cluster is reachable"
        );
        Ok(())
    }
}

fn transport_error(operation: &str, e: elasticsearch::Error) -> BackendError {
    BackendError::Internal {
        backend_name: BACKEND_NAME.to_string(),
        message: format!("{} request failed: {}", operation, e),
        source: Some(Box::new(e)),
    }
}

/// Reads a JSON body, turning non-success statuses into errors.
async fn read_json(operation: &'static str, response: Response) -> ExecutorResult<Value> {
    let status = response.status_code();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(BackendError::RequestFailed {
            operation,
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| BackendError::SerializationError {
            message: format!("Failed to parse {} response: {}", operation, e),
        })
}

#[async_trait]
impl IndexExecutor for ElasticsearchExecutor {
    async fn search(&self, body: Value, scroll: Option<&str>) -> ExecutorResult<Value> {
        let indices = [self.config.index_for(DocumentKind::Data)];
        let mut request = self.client.search(SearchParts::Index(&indices));
        if let Some(keep_alive) = scroll {
            request = request.scroll(keep_alive);
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| transport_error("search", e))?;

        read_json("search", response).await
    }

    async fn count(&self, kind: DocumentKind, query: Value) -> ExecutorResult<u64> {
        let index = self.config.index_for(kind);
        let response = self
            .client
            .count(CountParts::Index(&[index]))
            .body(json!({ "query": query }))
            .send()
            .await
            .map_err(|e| transport_error("count", e))?;

        let body = read_json("count", response).await?;
        body.get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| BackendError::SerializationError {
                message: "count response did not contain a numeric 'count'".to_string(),
            })
    }

    async fn scroll(&self, scroll_id: &str, keep_alive: &str) -> ExecutorResult<Value> {
        let response = self
            .client
            .scroll(ScrollParts::None)
            .body(json!({ "scroll": keep_alive, "scroll_id": scroll_id }))
            .send()
            .await
            .map_err(|e| transport_error("scroll", e))?;

        read_json("scroll", response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ElasticsearchConfig::default();
        assert_eq!(config.base_url, "http://localhost:9200");
        assert_eq!(config.index, "data");
        assert!(config.auth.is_none());
        assert_eq!(config.index_for(DocumentKind::Tag), "data");
    }

    #[test]
    fn test_tag_index_override() {
        let config = ElasticsearchConfig {
            tag_index: Some("tags".to_string()),
            ..Default::default()
        };
        assert_eq!(config.index_for(DocumentKind::Data), "data");
        assert_eq!(config.index_for(DocumentKind::Tag), "tags");
    }

    #[test]
    fn test_executor_creation_does_not_connect() {
        let executor = ElasticsearchExecutor::new(ElasticsearchConfig::default());
        assert!(executor.is_ok());
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let config = ElasticsearchConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        let err = ElasticsearchExecutor::new(config).unwrap_err();
        assert!(matches!(err, BackendError::ConnectionFailed { .. }));
    }
}
