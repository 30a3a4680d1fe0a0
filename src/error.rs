//! Error types for AstraVaani
//!
//! This module defines all error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for AstraVaani operations
///
/// Covers configuration loading, local persistence, backend API calls,
/// authentication, input validation, and usage limits.
#[derive(Error, Debug)]
pub enum VaaniError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local key-value storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Backend returned a non-success status that has no more specific variant
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the backend
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// The stored token is missing, expired, or rejected (HTTP 401)
    #[error("Not authenticated: {0}")]
    Unauthorized(String),

    /// Input rejected before or by the backend
    #[error("Validation error: {0}")]
    Validation(String),

    /// Usage or plan limit reached
    #[error("Limit reached: {0}")]
    QuotaExceeded(String),

    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A question is already being answered
    #[error("A question is already in progress; wait for the answer before asking again")]
    SubmissionPending,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl VaaniError {
    /// Returns true when the error should be rendered as a call to upgrade
    pub fn is_quota(&self) -> bool {
        matches!(self, VaaniError::QuotaExceeded(_))
    }
}

/// Result type alias for AstraVaani operations
///
/// Uses `anyhow::Error` so callers can attach context; domain failures are
/// recovered with `downcast_ref::<VaaniError>()`.
pub type Result<T> = anyhow::Result<T>;

/// Looks for a [`VaaniError`] anywhere in an `anyhow` error chain
pub fn find_vaani_error(err: &anyhow::Error) -> Option<&VaaniError> {
    err.chain().find_map(|cause| cause.downcast_ref::<VaaniError>())
}
