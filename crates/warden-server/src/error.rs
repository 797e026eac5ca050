//! API error types.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use warden_storage::StorageError;

/// API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No caller identity on the request.
    #[error("authentication required")]
    Unauthenticated,

    /// The caller may not perform this operation.
    #[error("moderator role required")]
    Forbidden,

    /// Malformed body, query string or path.
    #[error("invalid request: {0}")]
    BadRequest(String),

    /// Storage or moderation error.
    #[error("{0}")]
    Storage(#[from] StorageError),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ApiError {
    /// HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            ApiError::Storage(e) => match e {
                StorageError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
                StorageError::ContentNotFound { .. } => (StatusCode::NOT_FOUND, "content_not_found"),
                StorageError::ReportNotFound(_) => (StatusCode::NOT_FOUND, "report_not_found"),
                StorageError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                StorageError::DuplicateReport { .. } => (StatusCode::CONFLICT, "duplicate_report"),
                StorageError::AlreadyResolved { .. } => (StatusCode::CONFLICT, "already_resolved"),
                StorageError::ReportLimitExceeded(_) => {
                    (StatusCode::TOO_MANY_REQUESTS, "report_limit_exceeded")
                }
                StorageError::Transaction(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "transaction_failed")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            error!(code, error = %self, "Request failed");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;
