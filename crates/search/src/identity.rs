//! Identity resolution against the data-info service.

use std::time::Duration;

use async_trait::async_trait;
use cyverse_querydsl::identity::{Identity, IdentityError, IdentityResolver};
use serde::Deserialize;
use tracing::debug;

/// Resolves users through `GET {base}/users/{user}/groups?user={user}`.
#[derive(Debug, Clone)]
pub struct DataInfoResolver {
    client: reqwest::Client,
    base: String,
}

#[derive(Debug, Deserialize)]
struct GroupsResponse {
    user: String,
    #[serde(default)]
    groups: Vec<String>,
}

impl DataInfoResolver {
    /// Creates a resolver for the data-info service at `base`.
    pub fn new(base: impl Into<String>, timeout: Duration) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IdentityError::Unavailable {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base: base.into().trim_end_matches('/').to_string(),
        })
    }

    fn groups_url(&self, user: &str) -> Result<url::Url, IdentityError> {
        let mut url = url::Url::parse(&self.base).map_err(|e| IdentityError::Unavailable {
            message: format!("invalid data-info base URL: {}", e),
        })?;

        url.path_segments_mut()
            .map_err(|_| IdentityError::Unavailable {
                message: "data-info base URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .extend(["users", user, "groups"]);
        url.query_pairs_mut().append_pair("user", user);
        Ok(url)
    }
}

#[async_trait]
impl IdentityResolver for DataInfoResolver {
    async fn resolve(&self, user: &str) -> Result<Identity, IdentityError> {
        let url = self.groups_url(user)?;
        debug!(%url, "Resolving user groups");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let decoded: GroupsResponse =
            response
                .json()
                .await
                .map_err(|e| IdentityError::Unavailable {
                    message: format!("unreadable groups response: {}", e),
                })?;

        Ok(Identity::new(decoded.user, decoded.groups))
    }
}
