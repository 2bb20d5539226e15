//! Error types for the OpenStack API clients.

use thiserror::Error;

/// Result type for OpenStack API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Failures below HTTP: the request never produced a status code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request exceeded its timeout
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// The connection could not be established
    #[error("Connection to {url} failed: {reason}")]
    Connect { url: String, reason: String },

    /// Any other client-side failure (bad URL, body read error, ...)
    #[error("Request to {url} failed: {reason}")]
    Other { url: String, reason: String },
}

/// Errors returned by the OpenStack API clients.
///
/// Callers are expected to match on the variant: `AuthenticationNeeded`
/// means the token must be refreshed before the next cycle,
/// `InstancePowerOffFailure` is an expected resource state, and
/// `KeystoneUnreachable` means the identity service could not be reached.
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP 401: the token expired or was revoked
    #[error("Authentication needed: the API rejected the auth token")]
    AuthenticationNeeded,

    /// HTTP 409: the targeted instance is powered off
    #[error("Instance is powered off")]
    InstancePowerOffFailure,

    /// The identity endpoint could not be reached during an auth flow
    #[error("Keystone unreachable: {message}")]
    KeystoneUnreachable { message: String },

    /// Any other non-2xx response
    #[error("HTTP status {status} returned by {url}")]
    HttpStatus { status: u16, url: String },

    /// The request failed before a response was received
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The response body is not valid JSON
    #[error("Invalid JSON returned by {url}: {reason}")]
    Decode { url: String, reason: String },

    /// A full page was returned but its last item carries no `id`
    #[error("Cannot continue paginating {url}: last item has no id")]
    MissingMarker { url: String },

    /// Client configuration is invalid
    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

impl ApiError {
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Timeouts and connection failures: the endpoint is not answering
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            Self::Transport(TransportError::Timeout { .. })
                | Self::Transport(TransportError::Connect { .. })
                | Self::KeystoneUnreachable { .. }
        )
    }

    /// Whether the same request may succeed on a later attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::KeystoneUnreachable { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let timeout = ApiError::from(TransportError::Timeout {
            url: "http://nova".into(),
        });
        assert!(timeout.is_unreachable());
        assert!(timeout.is_retryable());

        let server_error = ApiError::HttpStatus {
            status: 503,
            url: "http://nova".into(),
        };
        assert!(!server_error.is_unreachable());
        assert!(server_error.is_retryable());

        assert!(!ApiError::AuthenticationNeeded.is_retryable());
        assert!(!ApiError::InstancePowerOffFailure.is_retryable());
    }
}
