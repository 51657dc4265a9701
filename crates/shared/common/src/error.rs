//! Application error handling.
//!
//! One error type for the service layer that renders as an HTTP response
//! with a stable client code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::{DomainError, StoreKind};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication & Authorization
    #[error("Authentication required")]
    Unauthorized,

    #[error("Access denied")]
    Forbidden,

    // Resource errors
    #[error("Resource not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    // Validation
    #[error("{0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    BadRequest(String),

    /// The destination record was written but the source could not be retired.
    #[error(
        "Migrated {source_kind} {source_id} to {target_kind} {new_id} but the source record was not removed"
    )]
    PartialMigration {
        source_kind: StoreKind,
        source_id: Uuid,
        target_kind: StoreKind,
        new_id: Uuid,
    },

    // External service errors
    #[cfg(feature = "database")]
    #[error("Database error")]
    Database(#[from] sea_orm::DbErr),

    #[cfg(feature = "jwt")]
    #[error("Authentication error")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    // Internal
    #[error("Internal server error")]
    Internal(String),
}

/// Error response body for HTTP
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Forbidden => "FORBIDDEN",
            AppError::NotFound => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::PartialMigration { .. } => "PARTIAL_MIGRATION",
            #[cfg(feature = "database")]
            AppError::Database(_) => "DATABASE_ERROR",
            #[cfg(feature = "jwt")]
            AppError::Jwt(_) => "AUTH_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            #[cfg(feature = "jwt")]
            AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::BadRequest(msg) | AppError::Conflict(msg) => {
                msg.clone()
            }

            // Operators need both ids to reconcile by hand
            AppError::PartialMigration { .. } => {
                tracing::error!("{}", self);
                self.to_string()
            }

            #[cfg(feature = "database")]
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "A database error occurred".to_string()
            }
            #[cfg(feature = "jwt")]
            AppError::Jwt(e) => {
                tracing::debug!("JWT error: {:?}", e);
                "Invalid or expired token".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }

            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code().to_string(),
                message: self.user_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::Password(msg) => AppError::Validation(msg),
            DomainError::InvalidFileRef(_) => AppError::BadRequest(err.to_string()),
            DomainError::UnknownReviewStatus(_) | DomainError::NotApplicable { .. } => {
                AppError::Validation(err.to_string())
            }
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Convenience constructors
impl AppError {
    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_migration_names_both_ids() {
        let source_id = Uuid::new_v4();
        let new_id = Uuid::new_v4();
        let err = AppError::PartialMigration {
            source_kind: StoreKind::Candidate,
            source_id,
            target_kind: StoreKind::Employer,
            new_id,
        };

        assert_eq!(err.code(), "PARTIAL_MIGRATION");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let message = err.user_message();
        assert!(message.contains(&source_id.to_string()));
        assert!(message.contains(&new_id.to_string()));
    }

    #[test]
    fn test_internal_message_is_hidden() {
        let err = AppError::internal("pool exhausted at 10.0.0.3");
        assert_eq!(err.user_message(), "An internal error occurred");
    }

    #[test]
    fn test_domain_errors_are_client_errors() {
        let err: AppError = DomainError::NotApplicable {
            kind: StoreKind::Admin,
            field: "education",
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: AppError = DomainError::password("too short").into();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}
