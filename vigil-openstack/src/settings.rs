//! Client defaults and configuration.

use crate::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_KEYSTONE_API_VERSION: &str = "v3";
pub const DEFAULT_NEUTRON_API_VERSION: &str = "v2.0";
pub const DEFAULT_PAGINATED_LIMIT: usize = 1000;
pub const DEFAULT_MAX_RETRY: usize = 5;

/// Scope sent with an unscoped keystone authentication
pub const UNSCOPED_AUTH: &str = "unscoped";

/// Outbound proxies, one per scheme
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
}

/// Configuration shared by every OpenStack API client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Per-request timeout, in seconds in configuration files
    #[serde(with = "duration_secs")]
    pub timeout: Duration,

    /// Verify TLS certificates of the endpoints
    pub ssl_verify: bool,

    /// Outbound proxies
    pub proxies: ProxySettings,

    /// Page size requested from paginated endpoints
    pub paginated_limit: usize,

    /// Attempts per continuation page before giving up
    pub max_retry: usize,

    pub keystone_api_version: String,
    pub neutron_api_version: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_API_REQUEST_TIMEOUT,
            ssl_verify: false,
            proxies: ProxySettings::default(),
            paginated_limit: DEFAULT_PAGINATED_LIMIT,
            max_retry: DEFAULT_MAX_RETRY,
            keystone_api_version: DEFAULT_KEYSTONE_API_VERSION.to_string(),
            neutron_api_version: DEFAULT_NEUTRON_API_VERSION.to_string(),
        }
    }
}

impl ApiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode and validate an instance document
    pub fn from_value(value: serde_json::Value) -> ApiResult<Self> {
        let config: Self = serde_json::from_value(value).map_err(|e| ApiError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_ssl_verify(mut self, ssl_verify: bool) -> Self {
        self.ssl_verify = ssl_verify;
        self
    }

    pub fn with_proxies(mut self, proxies: ProxySettings) -> Self {
        self.proxies = proxies;
        self
    }

    pub fn with_paginated_limit(mut self, limit: usize) -> Self {
        self.paginated_limit = limit;
        self
    }

    pub fn with_max_retry(mut self, max_retry: usize) -> Self {
        self.max_retry = max_retry;
        self
    }

    pub fn validate(&self) -> ApiResult<()> {
        if self.paginated_limit == 0 {
            return Err(ApiError::config("paginated_limit must be at least 1"));
        }
        if self.max_retry == 0 {
            return Err(ApiError::config("max_retry must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(ApiError::config("timeout must be positive"));
        }
        Ok(())
    }
}

mod duration_secs {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs)
            .map_err(|e| D::Error::custom(format!("invalid timeout {}: {}", secs, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.paginated_limit, 1000);
        assert_eq!(config.max_retry, 5);
        assert_eq!(config.keystone_api_version, "v3");
        assert_eq!(config.neutron_api_version, "v2.0");
        assert!(!config.ssl_verify);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document() {
        let config: ApiConfig = serde_json::from_value(json!({
            "timeout": 2.5,
            "ssl_verify": true,
            "proxies": { "https": "http://proxy:3128" },
            "paginated_limit": 50,
        }))
        .unwrap();

        assert_eq!(config.timeout, Duration::from_millis(2500));
        assert!(config.ssl_verify);
        assert_eq!(config.proxies.https.as_deref(), Some("http://proxy:3128"));
        assert_eq!(config.proxies.http, None);
        assert_eq!(config.paginated_limit, 50);
        assert_eq!(config.max_retry, DEFAULT_MAX_RETRY);
    }

    #[test]
    fn test_validation() {
        assert!(ApiConfig::new().with_paginated_limit(0).validate().is_err());
        assert!(ApiConfig::new().with_max_retry(0).validate().is_err());
        assert!(ApiConfig::new()
            .with_timeout(Duration::ZERO)
            .validate()
            .is_err());

        let negative: Result<ApiConfig, _> = serde_json::from_value(json!({ "timeout": -1 }));
        assert!(negative.is_err());

        let overflowing: Result<ApiConfig, _> = serde_json::from_value(json!({ "timeout": 1e30 }));
        assert!(overflowing.is_err());

        assert!(matches!(
            ApiConfig::from_value(json!({ "timeout": 1e30 })),
            Err(ApiError::Config { .. })
        ));
        assert!(matches!(
            ApiConfig::from_value(json!({ "max_retry": 0 })),
            Err(ApiError::Config { .. })
        ));
        assert_eq!(ApiConfig::from_value(json!({})).unwrap(), ApiConfig::default());
    }
}
