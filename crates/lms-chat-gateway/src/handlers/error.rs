//! Handler error types

use crate::protocol::CloseCode;
use lms_chat_core::DomainError;
use thiserror::Error;

/// Handler error type
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Frame or payload could not be decoded
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Request refused by domain rules; the connection stays open
    #[error("Rejected: {0}")]
    Rejected(#[from] DomainError),

    /// Outbound queue for this connection is gone
    #[error("Connection closed")]
    ConnectionClosed,
}

impl HandlerError {
    /// Convert to a close code, `None` when the connection should survive
    #[must_use]
    pub fn to_close_code(&self) -> Option<CloseCode> {
        match self {
            Self::InvalidPayload(_) => Some(CloseCode::DecodeError),
            Self::Rejected(_) => None,
            Self::ConnectionClosed => Some(CloseCode::UnknownError),
        }
    }

    /// Shorthand for a refused anonymous action
    #[must_use]
    pub fn anonymous(action: &'static str) -> Self {
        Self::Rejected(DomainError::AnonymousNotAllowed(action))
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
