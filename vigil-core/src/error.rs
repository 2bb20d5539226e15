//! # Error Types
//!
//! Errors raised by the shared check plumbing.

use thiserror::Error;

/// Errors that can occur while configuring or running a check.
///
/// Check-specific failures (API errors, record source errors) live in the
/// crate that owns the check; this enum only covers what every check
/// shares.
///
/// # Examples
///
/// ```rust
/// use vigil_core::CoreError;
///
/// let error = CoreError::config("namespace must not be empty");
/// assert_eq!(error.to_string(), "Configuration error: namespace must not be empty");
/// ```
#[derive(Error, Debug)]
pub enum CoreError {
    /// Instance configuration is missing a field or holds an invalid value
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// JSON serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Unexpected internal error
    #[error("Internal error: {reason}")]
    Internal { reason: String },
}

/// Result type for the shared check plumbing.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Creates a new configuration error with the given reason.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Creates a new internal error with the given reason.
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    /// Whether the error comes from the instance configuration rather than
    /// from the monitored system.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::Serialization(_))
    }
}
