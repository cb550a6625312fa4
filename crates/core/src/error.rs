//! Centralized error types for the boxgate workspace.

use thiserror::Error;

/// Top-level error enum. Variants map to subsystems.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GuardError {
    /// One or more touched boxes failed the write gate.
    #[error("Authorization denied for boxes: {}", boxes.join(", "))]
    AuthorizationDenied { boxes: Vec<String> },

    #[error("Malformed operation: {0}")]
    MalformedOperation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl GuardError {
    /// Whole-request rejections: nothing was applied and the caller's
    /// request itself is at fault.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::AuthorizationDenied { .. } | Self::MalformedOperation(_)
        )
    }

    /// HTTP status an outward-facing handler should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::AuthorizationDenied { .. } | Self::MalformedOperation(_) => 422,
            Self::NotFound(_) => 404,
            Self::Config(_) | Self::InvalidInput(_) => 400,
            Self::Store(_) => 500,
        }
    }
}

pub type GuardResult<T> = Result<T, GuardError>;
