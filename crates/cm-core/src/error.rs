//! # AppError
//!
//! Centralized error handling for Community Hub.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all cm-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or missing input (e.g., empty name, unparsable date)
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found (e.g., Community, Event, User)
    #[error("{0} not found with ID {1}")]
    NotFound(&'static str, String),

    /// The caller already holds a membership in the community
    #[error("user already in the community")]
    AlreadyMember,

    /// Resource already exists (e.g., duplicate email)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Missing, invalid or expired credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but not the owner/creator the mutation requires
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Backend failure surfaced by a repository port
    #[error(transparent)]
    Storage(#[from] anyhow::Error),

    /// Infrastructure failure outside storage (e.g., token signing)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    /// Message that is safe to hand to a client. Backend detail is withheld.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::NotFound(kind, _) => format!("{kind} not found"),
            AppError::AlreadyMember => self.to_string(),
            AppError::Conflict(msg) | AppError::Unauthorized(msg) | AppError::Forbidden(msg) => {
                msg.clone()
            }
            AppError::Storage(_) | AppError::Internal(_) => "internal server error".to_string(),
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, AppError::Storage(_) | AppError::Internal(_))
    }
}

/// A specialized Result type for Community Hub logic.
pub type Result<T> = std::result::Result<T, AppError>;
