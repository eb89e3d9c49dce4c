//! Per-request capabilities threaded through translation.
//!
//! [`RequestScope`] carries everything a clause processor may need from the
//! surrounding request: the acting identity, a handle to the index executor,
//! and the cancellation token for the request. Absent capabilities are plain
//! `None`s, so a processor that requires one fails with
//! [`QueryError::MissingContext`](crate::error::QueryError::MissingContext)
//! instead of guessing.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::clause::ClauseType;
use crate::error::{QueryError, QueryResult};
use crate::executor::IndexExecutor;
use crate::identity::Identity;

/// Capabilities available to clause processors for one request.
///
/// Cloning is cheap; every field is reference counted.
///
/// ```
/// use cyverse_querydsl::identity::Identity;
/// use cyverse_querydsl::scope::RequestScope;
///
/// let scope = RequestScope::new()
///     .with_identity(Identity::new("ipcdev#iplant", vec!["de-users".to_string()]));
/// assert!(scope.identity().is_some());
/// assert!(scope.executor().is_none());
/// ```
#[derive(Clone, Default)]
pub struct RequestScope {
    identity: Option<Arc<Identity>>,
    executor: Option<Arc<dyn IndexExecutor>>,
    cancel: CancellationToken,
    correlation_id: Option<String>,
}

impl fmt::Debug for RequestScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestScope")
            .field("identity", &self.identity)
            .field("has_executor", &self.executor.is_some())
            .field("cancelled", &self.cancel.is_cancelled())
            .field("correlation_id", &self.correlation_id)
            .finish()
    }
}

impl RequestScope {
    /// Creates an empty scope with a fresh cancellation token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the acting identity.
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(Arc::new(identity));
        self
    }

    /// Sets the index executor.
    pub fn with_executor(mut self, executor: Arc<dyn IndexExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Replaces the cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Sets a correlation ID for tracing.
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Returns the acting identity, if any.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_deref()
    }

    /// Returns the index executor, if any.
    pub fn executor(&self) -> Option<&Arc<dyn IndexExecutor>> {
        self.executor.as_ref()
    }

    /// Returns the cancellation token.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Returns the correlation ID, if set.
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// Returns true once the request has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns a scope sharing every capability but holding a child token.
    ///
    /// Cancelling the child leaves this scope untouched; cancelling this
    /// scope cancels the child.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            ..self.clone()
        }
    }

    /// Returns the identity or a [`QueryError::MissingContext`] for `clause_type`.
    pub fn require_identity(&self, clause_type: &str) -> QueryResult<&Identity> {
        self.identity().ok_or_else(|| QueryError::MissingContext {
            clause_type: ClauseType::from(clause_type),
            what: "an acting user",
        })
    }

    /// Returns the executor or a [`QueryError::MissingContext`] for `clause_type`.
    pub fn require_executor(&self, clause_type: &str) -> QueryResult<&Arc<dyn IndexExecutor>> {
        self.executor().ok_or_else(|| QueryError::MissingContext {
            clause_type: ClauseType::from(clause_type),
            what: "an index executor",
        })
    }
}
