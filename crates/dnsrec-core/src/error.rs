//! Error types for the reconciliation system
//!
//! This module defines all error types used throughout the crate.
//!
//! Classification matters more than wording here: the reconciler decides
//! whether to retry a create call purely from [`Error::is_transient`], and
//! the existence checker only reads "record absent" from
//! [`Error::is_not_found`].

use thiserror::Error;

/// Result type alias for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the reconciliation system
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A desired-record specification is malformed
    #[error("Invalid record spec: {0}")]
    InvalidSpec(String),

    /// The desired-record source could not be read or parsed
    #[error("Record source error: {0}")]
    Source(String),

    /// The provider call did not complete before its deadline
    ///
    /// This is the only transient condition; create calls failing with it
    /// are retried.
    #[error("Provider deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// The provider has no record matching the lookup
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The run was asked to stop before this operation finished
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid spec error
    pub fn invalid_spec(msg: impl Into<String>) -> Self {
        Self::InvalidSpec(msg.into())
    }

    /// Create a record source error
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Create a deadline exceeded (transient) error
    pub fn deadline_exceeded(msg: impl Into<String>) -> Self {
        Self::DeadlineExceeded(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a cancellation error
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Whether a failed create call may be retried
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::DeadlineExceeded(_))
    }

    /// Whether the provider explicitly reported that no such record exists
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}
