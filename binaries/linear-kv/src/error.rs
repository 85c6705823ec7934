//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use linear_kv_core::StoreError;
use linear_kv_report::ReportError;
use thiserror::Error;
use tracing::{debug, error};

/// Errors returned by the HTTP handlers.
///
/// Bodies are plain text, one line.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required field was missing or empty.
    #[error(transparent)]
    InvalidArgument(#[from] StoreError),

    /// The request body could not be parsed.
    #[error("invalid JSON")]
    MalformedInput { reason: String },

    /// The query string could not be parsed.
    #[error("invalid query")]
    MalformedQuery { reason: String },

    /// The route does not support the request method.
    #[error("method not allowed")]
    MethodNotSupported,

    /// A response could not be serialized.
    #[error("internal error")]
    Report(#[from] ReportError),

    /// A background task failed.
    #[error("internal error")]
    Internal { reason: String },
}

impl ApiError {
    /// Creates a malformed input error.
    pub fn malformed(reason: impl ToString) -> Self {
        Self::MalformedInput {
            reason: reason.to_string(),
        }
    }

    /// Creates a malformed query error.
    pub fn malformed_query(reason: impl ToString) -> Self {
        Self::MalformedQuery {
            reason: reason.to_string(),
        }
    }

    /// Creates an internal error.
    pub fn internal(reason: impl ToString) -> Self {
        Self::Internal {
            reason: reason.to_string(),
        }
    }

    /// The status code sent for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidArgument(_)
            | ApiError::MalformedInput { .. }
            | ApiError::MalformedQuery { .. } => StatusCode::BAD_REQUEST,
            ApiError::MethodNotSupported => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Report(_) | ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::MalformedInput { reason } => debug!(%reason, "malformed request body"),
            ApiError::MalformedQuery { reason } => debug!(%reason, "malformed query string"),
            ApiError::Report(e) => error!(error = %e, "failed to build response"),
            ApiError::Internal { reason } => error!(%reason, "request failed"),
            _ => debug!(error = %self, "request rejected"),
        }
        (status, format!("{}\n", self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::from(StoreError::invalid_argument("key required")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::malformed("eof").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::malformed_query("bad pair").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::MethodNotSupported.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            ApiError::internal("join").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ApiError::from(StoreError::invalid_argument("requestId and key required")).to_string(),
            "requestId and key required"
        );
        assert_eq!(ApiError::malformed("expected value").to_string(), "invalid JSON");
        assert_eq!(ApiError::malformed_query("bad pair").to_string(), "invalid query");
        assert_eq!(ApiError::MethodNotSupported.to_string(), "method not allowed");
    }
}
