//! Domain errors - error types for the domain layer

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Invalid user id: {0}")]
    InvalidUserId(String),

    #[error("Invalid chat id: {0}")]
    InvalidRoomId(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    // =========================================================================
    // Identity Errors
    // =========================================================================
    #[error("Anonymous connections cannot {0}")]
    AnonymousNotAllowed(&'static str),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUserId(_) => "INVALID_USER_ID",
            Self::InvalidRoomId(_) => "INVALID_CHAT_ID",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::AnonymousNotAllowed(_) => "ANONYMOUS_NOT_ALLOWED",
        }
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidUserId(_) | Self::InvalidRoomId(_) | Self::ValidationError(_)
        )
    }
}
