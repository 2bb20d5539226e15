//! Error types for the leader election check.

use thiserror::Error;

/// Result type for leader election operations
pub type LeaderResult<T> = Result<T, LeaderError>;

/// Errors that abort a leader election check cycle
#[derive(Error, Debug)]
pub enum LeaderError {
    /// The annotation payload is not a JSON object of the expected shape
    #[error("Malformed leader election record: {reason}")]
    MalformedRecord { reason: String },

    /// The configured record kind is not supported
    #[error("Unknown record kind {kind}, expected one of: ep, endpoints, configmap")]
    UnknownRecordKind { kind: String },

    /// Reading the Kubernetes object that holds the record failed
    #[error("Failed to read {kind} {namespace}/{name}: {reason}")]
    Source {
        kind: String,
        namespace: String,
        name: String,
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    /// Internal system error
    #[error("Internal system error: {reason}")]
    Internal { reason: String },
}

impl From<anyhow::Error> for LeaderError {
    fn from(err: anyhow::Error) -> Self {
        LeaderError::Internal {
            reason: err.to_string(),
        }
    }
}

/// Why a parsed record cannot be trusted.
///
/// Validation stops at the first failing check; the variants are listed in
/// check order.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidRecord {
    #[error("Invalid record: no current leader recorded")]
    NoLeader,

    #[error("Invalid record: no lease duration set")]
    NoLeaseDuration,

    #[error("Invalid record: no renew time set")]
    NoRenewTime,

    #[error("Invalid record: no acquire time recorded")]
    NoAcquireTime,

    #[error("Invalid record: bad format for renewTime field")]
    BadRenewTime,

    #[error("Invalid record: bad format for acquireTime field")]
    BadAcquireTime,
}

impl InvalidRecord {
    /// Whether a required field is missing, as opposed to malformed
    pub fn is_missing_field(self) -> bool {
        !matches!(self, InvalidRecord::BadRenewTime | InvalidRecord::BadAcquireTime)
    }
}
