//! Error types for clause-tree compilation.
//!
//! Errors fall into five categories: structural decode errors, semantic
//! validation errors, unknown clause types, authorization/consistency errors,
//! and downstream errors from the index executor or identity service. Every
//! error is fatal to the enclosing translation and bubbles up unchanged.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use std::fmt;

use thiserror::Error;

use crate::clause::ClauseType;

/// The primary error type for query compilation.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The clause tree shape is invalid (neither a Query nor a Clause).
    #[error("invalid clause tree: {message}")]
    InvalidTree { message: String },

    /// Clause arguments could not be decoded into the processor's argument type.
    #[error("failed to decode arguments for clause '{clause_type}': {message}")]
    Decode {
        clause_type: ClauseType,
        message: String,
    },

    /// A required argument combination is missing or a value is out of range.
    #[error("invalid '{clause_type}' clause: {message}")]
    Validation {
        clause_type: ClauseType,
        message: String,
    },

    /// No processor is registered for the clause type.
    #[error("no processor found for type '{clause_type}'")]
    UnknownClauseType { clause_type: ClauseType },

    /// A sort field is not in the allow-list.
    #[error("unknown sort field '{field}'")]
    UnknownSortField { field: String },

    /// The request scope lacks a capability the clause requires.
    #[error("clause '{clause_type}' requires {what} in the request scope")]
    MissingContext {
        clause_type: ClauseType,
        what: &'static str,
    },

    /// The tag ownership probe did not find every requested tag.
    #[error(
        "when querying for tags, got {found} rather than the full number passed, {expected}"
    )]
    TagOwnershipMismatch { expected: usize, found: u64 },

    /// The index executor or another collaborator failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The request was cancelled or its deadline passed.
    #[error("query translation was cancelled")]
    Cancelled,

    /// A translation task failed unexpectedly.
    #[error("internal error: {message}")]
    Internal { message: String },
}

/// Errors surfaced by the index executor.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Connection to the index failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// The index returned a non-success response.
    #[error("{operation} failed with status {status}: {body}")]
    RequestFailed {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The response body could not be interpreted.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Whether an error was caused by the caller's input or by the server side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad input: tree shape, arguments, unknown types or sort fields.
    Client,
    /// Authorization/consistency failures and dependency errors.
    Server,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::Client => write!(f, "client"),
            ErrorClass::Server => write!(f, "server"),
        }
    }
}

impl QueryError {
    /// Creates a validation error for the given clause type.
    pub fn validation(clause_type: impl Into<ClauseType>, message: impl Into<String>) -> Self {
        QueryError::Validation {
            clause_type: clause_type.into(),
            message: message.into(),
        }
    }

    /// Classifies the error for the host service.
    pub fn class(&self) -> ErrorClass {
        match self {
            QueryError::InvalidTree { .. }
            | QueryError::Decode { .. }
            | QueryError::Validation { .. }
            | QueryError::UnknownClauseType { .. }
            | QueryError::UnknownSortField { .. } => ErrorClass::Client,
            QueryError::MissingContext { .. }
            | QueryError::TagOwnershipMismatch { .. }
            | QueryError::Backend(_)
            | QueryError::Cancelled
            | QueryError::Internal { .. } => ErrorClass::Server,
        }
    }
}

/// Result type alias for query compilation.
pub type QueryResult<T> = Result<T, QueryError>;

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::SerializationError {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_clause_type_names_the_type() {
        let err = QueryError::UnknownClauseType {
            clause_type: ClauseType::new("bogus"),
        };
        assert_eq!(err.to_string(), "no processor found for type 'bogus'");
        assert_eq!(err.class(), ErrorClass::Client);
    }

    #[test]
    fn test_tag_mismatch_is_server_class() {
        let err = QueryError::TagOwnershipMismatch {
            expected: 3,
            found: 2,
        };
        assert!(err.to_string().contains("got 2"));
        assert_eq!(err.class(), ErrorClass::Server);
    }

    #[test]
    fn test_backend_error_conversion() {
        let err: QueryError = BackendError::RequestFailed {
            operation: "search",
            status: 503,
            body: "unavailable".to_string(),
        }
        .into();
        assert!(matches!(err, QueryError::Backend(_)));
        assert_eq!(err.class(), ErrorClass::Server);
    }
}
