//! Domain-level errors.
//!
//! These errors represent business rule violations inside the record
//! schemas. They are independent of infrastructure concerns (HTTP, database).

use thiserror::Error;

use crate::kind::StoreKind;

/// Domain-specific errors for business rule violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A scalar field failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Password-related errors
    #[error("Password error: {0}")]
    Password(String),

    /// A file reference escaped the upload root or was empty
    #[error("Invalid file reference: {0}")]
    InvalidFileRef(String),

    /// Review status outside Pending/Approve/Reject
    #[error("Unknown review status: {0}")]
    UnknownReviewStatus(String),

    /// Operation addresses a field the record's schema does not have
    #[error("{kind} records have no {field}")]
    NotApplicable { kind: StoreKind, field: &'static str },

    /// Internal domain error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    pub fn password(msg: impl Into<String>) -> Self {
        DomainError::Password(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        DomainError::Internal(msg.into())
    }
}

/// Result type alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
