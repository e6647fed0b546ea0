//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Seconds a caller should wait before retrying after a store timeout
const RETRY_AFTER_SECS: &str = "1";

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Authentication (401 / 400)
    #[error("Missing X-API-Key header")]
    MissingApiKey,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("API key is disabled")]
    ApiKeyDisabled,

    #[error("Invalid X-Request-User-Id header format")]
    InvalidUserHeader,

    #[error("Unknown user")]
    UnknownUser(i64),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] crate::domain::DomainError),

    // Server errors (5xx)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    /// Status, machine-readable code, optional detail, and the message shown to
    /// the caller. Server-side failures get a generic message.
    fn parts(&self) -> (StatusCode, &'static str, Option<String>, String) {
        use crate::domain::DomainError;

        match self {
            // 401 / 400 from the authentication layer
            AppError::MissingApiKey => (
                StatusCode::UNAUTHORIZED,
                "missing_api_key",
                None,
                self.to_string(),
            ),
            AppError::InvalidApiKey => (
                StatusCode::UNAUTHORIZED,
                "invalid_api_key",
                None,
                self.to_string(),
            ),
            AppError::ApiKeyDisabled => (
                StatusCode::UNAUTHORIZED,
                "api_key_disabled",
                None,
                self.to_string(),
            ),
            AppError::InvalidUserHeader => (
                StatusCode::BAD_REQUEST,
                "invalid_user_id",
                None,
                self.to_string(),
            ),
            AppError::UnknownUser(user_id) => (
                StatusCode::UNAUTHORIZED,
                "unknown_user",
                Some(format!("user {}", user_id)),
                self.to_string(),
            ),

            // Domain errors - map to appropriate HTTP status
            AppError::Domain(domain_err) => {
                let message = domain_err.to_string();
                let (status, code, details) = match domain_err {
                    DomainError::NotFound(what) => {
                        (StatusCode::NOT_FOUND, "not_found", Some(what.clone()))
                    }
                    DomainError::AlreadyOwned { .. } => {
                        (StatusCode::CONFLICT, "already_owned", None)
                    }
                    DomainError::AlreadyInCart { .. } => {
                        (StatusCode::CONFLICT, "already_in_cart", None)
                    }
                    DomainError::Conflict(msg) => {
                        (StatusCode::CONFLICT, "conflict", Some(msg.clone()))
                    }
                    DomainError::InvalidInput(msg) => {
                        (StatusCode::BAD_REQUEST, "invalid_input", Some(msg.clone()))
                    }
                    DomainError::Unauthorized(msg) => {
                        (StatusCode::UNAUTHORIZED, "unauthorized", Some(msg.clone()))
                    }
                    DomainError::NotOwned { .. } => {
                        (StatusCode::FORBIDDEN, "not_owned", None)
                    }
                    DomainError::EmptyCart => {
                        (StatusCode::BAD_REQUEST, "empty_cart", None)
                    }
                    DomainError::TransactionFailed => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "transaction_failed", None)
                    }
                    DomainError::Timeout => {
                        (StatusCode::SERVICE_UNAVAILABLE, "store_timeout", None)
                    }
                };
                (status, code, details, message)
            }

            // 503 / 500
            AppError::Database(e) if crate::db::is_timeout(e) => {
                tracing::warn!("Database timeout: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "store_timeout",
                    None,
                    "Store timed out, please retry".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    None,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    None,
                    "Internal server error".to_string(),
                )
            }
        }
    }

    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        self.parts().0
    }

    /// The whole operation may succeed if the caller tries again
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Domain(e) => e.is_retryable(),
            AppError::Database(e) => crate::db::is_timeout(e),
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details, error) = self.parts();

        if let AppError::Domain(e) = &self {
            if e.is_client_error() {
                tracing::info!(error_code, "Request rejected: {}", e);
            }
        }

        let body = ErrorResponse {
            error,
            error_code: error_code.to_string(),
            details,
        };

        if self.is_retryable() {
            return (
                status,
                [(header::RETRY_AFTER, RETRY_AFTER_SECS)],
                Json(body),
            )
                .into_response();
        }

        (status, Json(body)).into_response()
    }
}
