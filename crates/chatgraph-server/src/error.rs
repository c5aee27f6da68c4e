//! API error types with HTTP status code mapping.
//!
//! [`ApiError`] is the unified error type for all API endpoints. It
//! implements `axum::response::IntoResponse` to produce structured JSON
//! error responses with appropriate HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use chatgraph_storage::StorageError;
use chatgraph_sync::SyncError;

/// Structured error detail in API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "BAD_REQUEST").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API errors with HTTP status code mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Entity not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The remote graph service failed or answered badly (502).
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Internal server error (500).
    #[error("internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ApiErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: msg.clone(),
                },
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorDetail {
                    code: "BAD_REQUEST".to_string(),
                    message: msg.clone(),
                },
            ),
            ApiError::Upstream(msg) => (
                StatusCode::BAD_GATEWAY,
                ApiErrorDetail {
                    code: "UPSTREAM_ERROR".to_string(),
                    message: msg.clone(),
                },
            ),
            ApiError::InternalError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: msg.clone(),
                },
            ),
        };

        let body = serde_json::json!({
            "success": false,
            "error": detail,
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match &err {
            SyncError::UnknownUser(_) => ApiError::NotFound(err.to_string()),
            SyncError::Http(_) | SyncError::Api { .. } => ApiError::Upstream(err.to_string()),
            SyncError::Storage(_) | SyncError::Serialization(_) => {
                ApiError::InternalError(err.to_string())
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}
