//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Registry API                       │
//! │                                                                         │
//! │  handler → ProducerService → Result<T, ServiceError>                    │
//! │                                      │                                  │
//! │              ┌───────────────────────┴───────────────────┐              │
//! │              ▼                                           ▼              │
//! │   ServiceError::Domain(CoreError)         ServiceError::Store(DbError)  │
//! │   message passed through, 4xx             logged, 500 + store message   │
//! │              │                                           │              │
//! │              └───────────────────► ApiError ◄────────────┘              │
//! │                                       │                                 │
//! │                                       ▼                                 │
//! │                     { "code": "...", "message": "..." }                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use agro_core::CoreError;
use agro_db::DbError;
use agro_service::ServiceError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Error body returned to HTTP clients.
///
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Producer not found: 3f1c..."
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Agricultural plus vegetation area exceeds total (400)
    InvalidArea,

    /// Some but not all area fields in an update (400)
    InconsistentAreaFields,

    /// Unknown crop id (400)
    InvalidCropReference,

    /// Document already registered (409)
    DuplicateDocument,

    /// Database operation failed (500)
    DatabaseError,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError
            | ErrorCode::InvalidArea
            | ErrorCode::InconsistentAreaFields
            | ErrorCode::InvalidCropReference => StatusCode::BAD_REQUEST,
            ErrorCode::DuplicateDocument => StatusCode::CONFLICT,
            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a database error with a message safe to show clients.
    pub fn database(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::DatabaseError, message)
    }
}

/// Converts database errors to API errors.
///
/// Connection-level detail stays in the log. Query and transaction failures
/// carry the store's message after a generic prefix.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => {
                ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", entity, id))
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::database("Database connection failed")
            }
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                ApiError::database("Database is busy")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::database(format!("Database transaction failed: {}", e))
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Query failed: {}", e);
                ApiError::database(format!("Database operation failed: {}", e))
            }
            other => {
                tracing::error!("Database operation failed: {}", other);
                ApiError::database("Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors. Messages pass through unchanged.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::InvalidArea { .. } => ErrorCode::InvalidArea,
            CoreError::InconsistentAreaFields => ErrorCode::InconsistentAreaFields,
            CoreError::InvalidCropReference { .. } => ErrorCode::InvalidCropReference,
            CoreError::DuplicateDocument(_) => ErrorCode::DuplicateDocument,
            CoreError::ProducerNotFound(_) => ErrorCode::NotFound,
            CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        let message = match err {
            CoreError::Validation(inner) => inner.to_string(),
            other => other.to_string(),
        };
        ApiError::new(code, message)
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => e.into(),
            ServiceError::Store(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        if status.is_client_error() {
            tracing::warn!(code = ?self.code, message = %self.message, "Request rejected");
        }
        (status, Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
