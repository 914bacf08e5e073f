//! Custom error types for the records service

use assistant::AssistantError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::{authz::Forbidden, error::DatabaseError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the records service
#[derive(Error, Debug)]
pub enum RecordsError {
    /// Missing, malformed or expired session token
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(#[from] Forbidden),

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(String),

    /// No API key configured for the chat assistant
    #[error("The assistant is not available")]
    AssistantUnavailable,

    #[error("Assistant error: {0}")]
    Assistant(#[from] AssistantError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl RecordsError {
    pub fn code(&self) -> &'static str {
        match self {
            RecordsError::Unauthorized => "unauthorized",
            RecordsError::Forbidden(_) => "forbidden",
            RecordsError::BadRequest(_) => "bad_request",
            RecordsError::NotFound(_) => "not_found",
            RecordsError::AssistantUnavailable => "assistant_unavailable",
            RecordsError::Assistant(_) => "assistant_failure",
            RecordsError::Database(DatabaseError::UniqueViolation(_)) => "conflict",
            RecordsError::Database(_) => "storage_failure",
        }
    }
}

impl IntoResponse for RecordsError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            RecordsError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            RecordsError::Forbidden(e) => (StatusCode::FORBIDDEN, e.to_string()),
            RecordsError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            RecordsError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            RecordsError::AssistantUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            RecordsError::Assistant(e) => {
                error!("Assistant request failed: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "The assistant could not answer, please try again.".to_string(),
                )
            }
            RecordsError::Database(DatabaseError::UniqueViolation(_)) => (
                StatusCode::CONFLICT,
                "A record with this identifier already exists".to_string(),
            ),
            RecordsError::Database(e) => {
                error!("Database error: {}", e);
                let status = if e.is_transient() {
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (status, "Database error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}

/// Type alias for records results
pub type RecordsResult<T> = Result<T, RecordsError>;
