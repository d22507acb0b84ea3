//! # AppError
//!
//! Centralized error handling for the civic-feed client.
//! Every failure the core can surface is one of these variants; the
//! gateway normalizes transport-level errors into this shape exactly once,
//! so callers above it never inspect status codes.

use thiserror::Error;

/// The primary error type for all client-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// The session is unrecoverable: a 401 whose retry-after-refresh also
    /// failed, or the refresh endpoint itself rejected the refresh token.
    /// Always terminal for the current session.
    #[error("session expired: {0}")]
    AuthExpired(String),

    /// Any other non-2xx response or transport failure, carrying the
    /// best human-readable message that could be extracted.
    #[error("{0}")]
    Request(String),

    /// Client-side rejection before a request is ever issued
    /// (e.g., empty credentials).
    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// True when this error must end the current session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppError::AuthExpired(_))
    }
}

/// A specialized Result type for civic-feed client logic.
pub type Result<T> = std::result::Result<T, AppError>;
