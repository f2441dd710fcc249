//! Error types for ReelDB
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using ReelError
pub type Result<T> = std::result::Result<T, ReelError>;

/// Unified error type for ReelDB operations
#[derive(Debug, Error)]
pub enum ReelError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    /// Transport failure: closed peer, short transfer, hard socket error.
    /// Always fatal to the connection it happened on.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Request Errors
    // -------------------------------------------------------------------------
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Film not found")]
    NotFound,

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server answered with INTERNAL_ERROR
    #[error("Server reported an internal error: {0}")]
    Remote(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ReelError {
    /// Shorthand for building a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        ReelError::Validation(message.into())
    }
}
