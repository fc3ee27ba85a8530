//! Error types for zone reconciliation
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for zonesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for zonesync
#[derive(Error, Debug)]
pub enum Error {
    /// A provider call failed (network, HTTP status, API-level error).
    ///
    /// Propagated verbatim, never retried locally.
    #[error("Transport error ({transport}): {message}")]
    Transport {
        /// Transport name (e.g. "glesys")
        transport: String,
        /// Error message
        message: String,
    },

    /// Malformed input rejected before any provider call
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The provider answered with data that does not belong to the requested zone
    #[error("Inconsistent provider response: {0}")]
    Consistency(String),

    /// A rollback step failed after an execution failure.
    ///
    /// Provider state matches neither the previous nor the desired state.
    #[error(
        "Rollback failed after undoing {undone} operation(s), {remaining} left unresolved: {source} (original error: {original})"
    )]
    Compensation {
        /// The execution error that triggered the rollback
        original: Box<Error>,
        /// The compensating call that failed
        source: Box<Error>,
        /// Compensating operations that completed before the failure
        undone: usize,
        /// Compensating operations not completed (including the failed one)
        remaining: usize,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (config files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a transport error
    pub fn transport(transport: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            transport: transport.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a consistency error
    pub fn consistency(msg: impl Into<String>) -> Self {
        Self::Consistency(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a compensation error wrapping the original failure
    pub fn compensation(original: Error, source: Error, undone: usize, remaining: usize) -> Self {
        Self::Compensation {
            original: Box::new(original),
            source: Box::new(source),
            undone,
            remaining,
        }
    }

    /// Whether this error means provider state is left partially changed
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Compensation { .. })
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
