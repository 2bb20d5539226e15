//! Authenticated, cached GET requests shared by every OpenStack service client.

use crate::{
    ApiConfig, ApiError, ApiRequestCache, ApiResult, CacheKey, Headers, HttpRequest,
    HttpTransport, QueryParams, ReqwestTransport,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Header carrying the auth token on every authenticated call
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Base client for one OpenStack service endpoint.
///
/// A client is built per check run with a fresh token, so its request cache
/// starts empty and lives exactly as long as that run.
pub struct AbstractApi {
    endpoint: String,
    auth_token: String,
    headers: Headers,
    config: ApiConfig,
    transport: Arc<dyn HttpTransport>,
    cache: ApiRequestCache,
}

impl AbstractApi {
    /// Create a client talking to `endpoint` over HTTP
    pub fn new(
        endpoint: impl Into<String>,
        auth_token: impl Into<String>,
        config: ApiConfig,
    ) -> ApiResult<Self> {
        config.validate()?;
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        Ok(Self::with_transport(endpoint, auth_token, config, transport))
    }

    /// Create a client on top of an existing transport
    pub fn with_transport(
        endpoint: impl Into<String>,
        auth_token: impl Into<String>,
        config: ApiConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let auth_token = auth_token.into();
        let mut headers = Headers::new();
        headers.insert(AUTH_TOKEN_HEADER.to_string(), auth_token.clone());

        Self {
            endpoint: endpoint.into(),
            auth_token,
            headers,
            config,
            transport,
            cache: ApiRequestCache::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    /// Headers sent with every authenticated request
    pub fn auth_headers(&self) -> &Headers {
        &self.headers
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn cache(&self) -> &ApiRequestCache {
        &self.cache
    }

    pub(crate) fn transport(&self) -> &dyn HttpTransport {
        self.transport.as_ref()
    }

    /// Probe the endpoint base URL
    pub async fn get_endpoint(&self) -> ApiResult<Value> {
        self.make_request(&self.endpoint, &self.headers, None).await
    }

    /// Issue a GET request, serving repeated requests from the cache.
    ///
    /// Non-2xx responses are classified: 401 becomes
    /// [`ApiError::AuthenticationNeeded`], 409 becomes
    /// [`ApiError::InstancePowerOffFailure`], anything else
    /// [`ApiError::HttpStatus`]. Failed requests are never cached.
    pub async fn make_request(
        &self,
        url: &str,
        headers: &Headers,
        params: Option<&QueryParams>,
    ) -> ApiResult<Value> {
        debug!(
            "Request URL, Headers and Params: {}, {:?}, {:?}",
            url,
            headers.keys().collect::<Vec<_>>(),
            params
        );

        let key = CacheKey::new(url, headers, params, self.config.timeout);
        if let Some(cached) = self.cache.get(&key) {
            debug!("Request found in cache. cache key {}", key);
            return Ok(cached);
        }

        let request = HttpRequest::get(url)
            .with_headers(headers.clone())
            .with_params(params.cloned())
            .with_timeout(self.config.timeout);
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            debug!(
                "Error contacting openstack endpoint: {} returned {}",
                url, response.status
            );
            return Err(match response.status {
                401 => {
                    info!("Need to reauthenticate before next check");
                    ApiError::AuthenticationNeeded
                }
                409 => ApiError::InstancePowerOffFailure,
                status => ApiError::HttpStatus {
                    status,
                    url: url.to_string(),
                },
            });
        }

        let body: Value = response.decode(url)?;
        debug!("url: {} || response: {}", url, body);

        // A concurrent identical request may have stored its body first.
        Ok(self.cache.insert(key, body))
    }
}

/// Array stored under `field`, empty when absent or not an array
pub(crate) fn array_field(body: &Value, field: &str) -> Vec<Value> {
    body.get(field)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}
