//! Error types for the search service.
//!
//! Every error is rendered as `{"error": "<message>"}` with a status chosen
//! by the failure's origin:
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | BadRequest | 400 |
//! | Query (client class) | 400 |
//! | Query (tag ownership, missing context, internal) | 500 |
//! | Query (index failure) | 502 |
//! | Query (cancelled) | 504 |
//! | Identity (upstream) | relayed status and body |
//! | Identity (unavailable) | 502 |

use std::fmt;

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use cyverse_querydsl::error::{ErrorClass, QueryError};
use cyverse_querydsl::identity::IdentityError;
use tracing::{error, warn};

/// The primary error type for search service operations.
#[derive(Debug)]
pub enum ApiError {
    /// The request itself is malformed (HTTP 400).
    BadRequest {
        /// Message describing the problem.
        message: String,
    },

    /// Compiling or running the query failed.
    Query(QueryError),

    /// Resolving the acting user failed.
    Identity(IdentityError),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest { message } => write!(f, "{}", message),
            ApiError::Query(err) => write!(f, "{}", err),
            ApiError::Identity(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
        }
    }

    /// Returns the HTTP status this error is answered with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Query(QueryError::Backend(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Query(QueryError::Cancelled) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Query(err) => match err.class() {
                ErrorClass::Client => StatusCode::BAD_REQUEST,
                ErrorClass::Server => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Identity(IdentityError::Upstream { status, .. }) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::Identity(IdentityError::Unavailable { .. }) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::Query(err)
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        ApiError::Identity(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Upstream identity answers are passed through untouched.
        if let ApiError::Identity(IdentityError::Upstream { body, .. }) = self {
            warn!(status = status.as_u16(), "Relaying identity service response");
            return (
                status,
                [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
                body,
            )
                .into_response();
        }

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "Rejected request");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

/// Result type alias for search service handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use cyverse_querydsl::clause::ClauseType;
    use cyverse_querydsl::error::BackendError;

    #[test]
    fn test_client_query_errors_are_bad_requests() {
        let err: ApiError = QueryError::UnknownClauseType {
            clause_type: ClauseType::new("colour"),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "no processor found for type 'colour'");
    }

    #[test]
    fn test_server_query_errors() {
        let mismatch: ApiError = QueryError::TagOwnershipMismatch {
            expected: 2,
            found: 1,
        }
        .into();
        assert_eq!(mismatch.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let backend: ApiError = QueryError::Backend(BackendError::RequestFailed {
            operation: "search",
            status: 503,
            body: String::new(),
        })
        .into();
        assert_eq!(backend.status_code(), StatusCode::BAD_GATEWAY);

        let cancelled: ApiError = QueryError::Cancelled.into();
        assert_eq!(cancelled.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_identity_upstream_status_is_relayed() {
        let err: ApiError = IdentityError::Upstream {
            status: 404,
            body: r#"{"error_code":"ERR_NOT_A_USER"}"#.to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_bad_request_response() {
        let response = ApiError::bad_request("missing user").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
