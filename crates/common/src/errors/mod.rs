//! Error types for MeetPrep services
//!
//! Provides a comprehensive error handling system with:
//! - Distinct error types for store, parsing and engine failures
//! - HTTP status code mapping
//! - Structured error responses
//! - Error codes for client handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    InvalidFormat,

    // Resource errors (4xxx)
    NotFound,

    // Database / store errors (7xxx)
    DatabaseError,
    ConnectionError,
    StoreQueryError,
    StoreTimeout,

    // Record errors (8xxx)
    ParseError,

    // Internal errors (9xxx)
    InternalError,
    EngineError,
    ConfigurationError,
    SerializationError,

    // Service unavailable
    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,
            ErrorCode::InvalidFormat => 1003,

            ErrorCode::NotFound => 4001,

            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,
            ErrorCode::StoreQueryError => 7004,
            ErrorCode::StoreTimeout => 7005,

            ErrorCode::ParseError => 8001,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
            ErrorCode::EngineError => 9004,

            ErrorCode::ServiceUnavailable => 9999,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    // Resource errors
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    // Store errors (a single pattern query)
    #[error("Store query failed for pattern {pattern:?}: {message}")]
    StoreQuery { pattern: String, message: String },

    #[error("Store query for pattern {pattern:?} timed out after {timeout_ms}ms")]
    StoreTimeout { pattern: String, timeout_ms: u64 },

    // Record errors
    #[error("Malformed record: {message}")]
    Parse { message: String },

    // Internal errors
    #[error("Search engine failure: {message}")]
    Engine { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::StoreQuery { .. } => ErrorCode::StoreQueryError,
            AppError::StoreTimeout { .. } => ErrorCode::StoreTimeout,
            AppError::Parse { .. } => ErrorCode::ParseError,
            AppError::Engine { .. } => ErrorCode::EngineError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::ServiceUnavailable { .. } => ErrorCode::ServiceUnavailable,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } |
            AppError::InvalidFormat { .. } => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,

            // 500 Internal Server Error
            AppError::Database(_) |
            AppError::DatabaseConnection { .. } |
            AppError::Parse { .. } |
            AppError::Engine { .. } |
            AppError::Internal { .. } |
            AppError::Configuration { .. } |
            AppError::Serialization(_) |
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 502 Bad Gateway
            AppError::StoreQuery { .. } => StatusCode::BAD_GATEWAY,

            // 503 / 504
            AppError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::StoreTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Failures of a single store query; the caller may skip and continue
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            AppError::StoreQuery { .. }
                | AppError::StoreTimeout { .. }
                | AppError::Database(_)
                | AppError::DatabaseConnection { .. }
        )
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let field = match self {
            AppError::Validation { field, .. } => field,
            _ => None,
        };

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
                field,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::StoreTimeout {
            pattern: "%ford%".into(),
            timeout_ms: 5000,
        };
        assert_eq!(err.code(), ErrorCode::StoreTimeout);
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert!(err.is_store_failure());
    }

    #[test]
    fn test_validation_error() {
        let err = AppError::Validation {
            message: "label must not be empty".into(),
            field: Some("label".into()),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_server_error());
        assert!(err.is_client_error());
        assert!(!err.is_store_failure());
    }

    #[test]
    fn test_parse_error_is_not_store_failure() {
        let err = AppError::Parse {
            message: "metadata.summary missing".into(),
        };
        assert_eq!(err.code().as_code(), 8001);
        assert!(!err.is_store_failure());
    }

    #[test]
    fn test_server_error() {
        let err = AppError::Engine {
            message: "scoring pass panicked".into(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_server_error());
    }
}
