//! Acting-user identity and the identity resolution contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The acting user and the groups it belongs to.
///
/// Names are qualified (`user#zone`) as returned by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    user: String,
    #[serde(default)]
    groups: Vec<String>,
}

impl Identity {
    /// Creates an identity from a user and its group memberships.
    pub fn new(user: impl Into<String>, groups: Vec<String>) -> Self {
        Self {
            user: user.into(),
            groups,
        }
    }

    /// Returns the primary user name.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Returns the user's groups.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Returns the effective identity set: every group followed by the user.
    pub fn effective(&self) -> Vec<String> {
        let mut all = self.groups.clone();
        all.push(self.user.clone());
        all
    }
}

/// Errors returned by an [`IdentityResolver`].
#[derive(Error, Debug)]
pub enum IdentityError {
    /// The identity service answered with a non-success status.
    ///
    /// The status and body are kept so the host service can relay them.
    #[error("identity service returned status {status}")]
    Upstream {
        /// HTTP status returned by the service.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The identity service could not be reached or its answer was unreadable.
    #[error("identity lookup failed: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}

/// Resolves a user name to its effective identity.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Looks up `user` and its group memberships.
    async fn resolve(&self, user: &str) -> Result<Identity, IdentityError>;
}
