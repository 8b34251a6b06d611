//! Error handling module for the reviewer backend.
//!
//! Provides the error taxonomy shared by storage, the reassignment engine and
//! the REST layer, with mapping to HTTP status codes and response envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const NO_CONTENT: &str = "NO_CONTENT";
    pub const NO_CANDIDATE: &str = "NO_CANDIDATE";
    pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
    pub const CONFLICT: &str = "CONFLICT";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Message shown to clients for every internal failure.
pub const INTERNAL_MESSAGE: &str = "internal service error, try again later";

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Referenced pull request, team or member is absent
    NotFound(String),
    /// Query succeeded but yielded nothing usable
    NoContent(String),
    /// Roster present but nobody passes the eligibility rules
    NoEligibleCandidate,
    /// Unique identity already taken
    Duplicate(String),
    /// State precondition violated
    Conflict(String),
    /// Malformed client input
    Validation(String),
    /// Storage or any other unexpected fault; details never reach clients
    Internal(String),
    /// A unit of work failed and rolling it back failed too
    RollbackFailed {
        cause: Box<AppError>,
        rollback: String,
    },
}

impl AppError {
    /// Merge a failed rollback into the error that triggered it.
    pub fn with_rollback_failure(self, rollback: AppError) -> Self {
        AppError::RollbackFailed {
            cause: Box::new(self),
            rollback: rollback.to_string(),
        }
    }

    /// The originating error, looking through rollback wrappers.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::RollbackFailed { cause, .. } => cause.root(),
            other => other,
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self.root() {
            AppError::NotFound(_) | AppError::NoContent(_) => StatusCode::NOT_FOUND,
            AppError::NoEligibleCandidate => StatusCode::CONFLICT,
            AppError::Duplicate(_) => StatusCode::CONFLICT,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) | AppError::RollbackFailed { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self.root() {
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::NoContent(_) => codes::NO_CONTENT,
            AppError::NoEligibleCandidate => codes::NO_CANDIDATE,
            AppError::Duplicate(_) => codes::ALREADY_EXISTS,
            AppError::Conflict(_) => codes::CONFLICT,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::Internal(_) | AppError::RollbackFailed { .. } => codes::INTERNAL_ERROR,
        }
    }

    /// Get the client-facing error message.
    pub fn message(&self) -> String {
        match self.root() {
            AppError::NotFound(msg) => msg.clone(),
            AppError::NoContent(msg) => msg.clone(),
            AppError::NoEligibleCandidate => {
                "no active replacement candidate in team".to_string()
            }
            AppError::Duplicate(msg) => msg.clone(),
            AppError::Conflict(msg) => msg.clone(),
            AppError::Validation(msg) => msg.clone(),
            AppError::Internal(_) | AppError::RollbackFailed { .. } => INTERNAL_MESSAGE.to_string(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Internal(detail) => write!(f, "{}: {}", codes::INTERNAL_ERROR, detail),
            AppError::RollbackFailed { cause, rollback } => {
                write!(f, "{} (rollback failed: {})", cause, rollback)
            }
            other => write!(f, "{}: {}", other.error_code(), other.message()),
        }
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Internal(format!("database error: {}", err))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}
