//! Domain-level error types.

use serde::Serialize;
use thiserror::Error;

/// A single field-level validation problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Domain errors - the outcome kinds every service operation resolves to.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation failed: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Entity not found: {entity_type} {key}")]
    NotFound {
        entity_type: &'static str,
        key: String,
    },

    #[error("Conflict: {field} is already taken")]
    Conflict { field: String },

    #[error("Upstream failure: {message}")]
    Upstream { message: String, retryable: bool },
}

impl DomainError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    pub fn not_found(entity_type: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            key: key.to_string(),
        }
    }

    pub fn conflict(field: impl Into<String>) -> Self {
        Self::Conflict {
            field: field.into(),
        }
    }

    /// Whether the caller may safely retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Upstream {
                retryable: true,
                ..
            }
        )
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    /// Uniqueness violation; carries the offending field name when known.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Storage call timed out")]
    Timeout,
}

impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => DomainError::not_found("record", "unknown"),
            RepoError::Constraint(field) => DomainError::Conflict { field },
            RepoError::Timeout => DomainError::Upstream {
                message: "storage timed out".to_string(),
                retryable: true,
            },
            RepoError::Connection(msg) => DomainError::Upstream {
                message: msg,
                retryable: true,
            },
            RepoError::Query(msg) => DomainError::Upstream {
                message: msg,
                retryable: false,
            },
        }
    }
}
