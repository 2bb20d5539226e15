//! Keystone (identity) API client.
//!
//! Authentication and the auth-scoped project listing bypass the request
//! cache and always use [`DEFAULT_API_REQUEST_TIMEOUT`]; a failure to reach
//! keystone on those paths surfaces as [`ApiError::KeystoneUnreachable`].

use crate::api::array_field;
use crate::{
    AbstractApi, ApiConfig, ApiError, ApiResult, Headers, HttpRequest, HttpTransport,
    TransportError, AUTH_TOKEN_HEADER, DEFAULT_API_REQUEST_TIMEOUT,
};
use reqwest::Url;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Response header carrying the token issued by keystone
pub const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

const REDACTED: &str = "********";

/// Outcome of a successful token request
#[derive(Debug, Clone, PartialEq)]
pub struct KeystoneToken {
    /// Value of the `X-Subject-Token` response header
    pub subject_token: Option<String>,
    /// Decoded response body
    pub body: Value,
}

pub struct KeystoneApi {
    api: AbstractApi,
    base: Url,
}

impl KeystoneApi {
    pub fn new(
        endpoint: impl Into<String>,
        auth_token: impl Into<String>,
        config: ApiConfig,
    ) -> ApiResult<Self> {
        let api = AbstractApi::new(endpoint, auth_token, config)?;
        Self::from_api(api)
    }

    pub fn with_transport(
        endpoint: impl Into<String>,
        auth_token: impl Into<String>,
        config: ApiConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> ApiResult<Self> {
        config.validate()?;
        Self::from_api(AbstractApi::with_transport(
            endpoint, auth_token, config, transport,
        ))
    }

    fn from_api(api: AbstractApi) -> ApiResult<Self> {
        let base = Url::parse(api.endpoint()).map_err(|e| {
            ApiError::config(format!("invalid keystone endpoint {}: {}", api.endpoint(), e))
        })?;
        Ok(Self { api, base })
    }

    pub fn api(&self) -> &AbstractApi {
        &self.api
    }

    /// Resolve `{version}/{path}` against the endpoint, urljoin style
    fn url(&self, path: &str) -> ApiResult<String> {
        let reference = format!("{}/{}", self.api.config().keystone_api_version, path);
        self.base
            .join(&reference)
            .map(String::from)
            .map_err(|e| ApiError::config(format!("cannot build keystone url {}: {}", reference, e)))
    }

    /// Request a token for `identity`, scoped by `scope`.
    ///
    /// Any non-2xx answer, timeout or connection failure is reported as
    /// [`ApiError::KeystoneUnreachable`]; secrets in `identity` are masked
    /// in the message.
    pub async fn post_auth_token(&self, identity: &Value, scope: &Value) -> ApiResult<KeystoneToken> {
        let url = self.url("auth/tokens")?;
        let payload = json!({ "auth": { "identity": identity, "scope": scope } });

        let request = HttpRequest::post(url.as_str())
            .with_header("Content-Type", "application/json")
            .with_body(payload.to_string())
            .with_timeout(DEFAULT_API_REQUEST_TIMEOUT);

        let scope_text = scope
            .as_str()
            .map_or_else(|| scope.to_string(), str::to_string);
        let unreachable = || {
            let message = format!(
                "Failed keystone auth with identity:{} scope:{} @{}",
                redact(identity),
                scope_text,
                url
            );
            debug!("{}", message);
            ApiError::KeystoneUnreachable { message }
        };

        let response = match self.api.transport().send(request).await {
            Ok(response) if response.is_success() => response,
            Ok(_) => return Err(unreachable()),
            Err(TransportError::Timeout { .. } | TransportError::Connect { .. }) => {
                return Err(unreachable())
            }
            Err(e) => return Err(e.into()),
        };

        let body: Value = response.decode(&url)?;
        debug!("url: {} || response: {}", url, redact(&body));

        Ok(KeystoneToken {
            subject_token: response.header(SUBJECT_TOKEN_HEADER).map(str::to_string),
            body,
        })
    }

    /// Request a token for `identity` with the `"unscoped"` scope
    pub async fn post_unscoped_auth_token(&self, identity: &Value) -> ApiResult<KeystoneToken> {
        self.post_auth_token(identity, &Value::from(crate::UNSCOPED_AUTH))
            .await
    }

    /// Projects the current token may scope to, `None` when keystone omits them
    pub async fn get_auth_projects(&self) -> ApiResult<Option<Vec<Value>>> {
        let url = self.url("auth/projects")?;
        let request = HttpRequest::get(url.as_str())
            .with_headers(self.api.auth_headers().clone())
            .with_timeout(DEFAULT_API_REQUEST_TIMEOUT);

        let unreachable = |cause: String| {
            let message = format!(
                "unable to retrieve project list from keystone auth with identity: @{}: {}",
                url, cause
            );
            debug!("{}", message);
            ApiError::KeystoneUnreachable { message }
        };

        let response = match self.api.transport().send(request).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                return Err(unreachable(format!("HTTP status {}", response.status)))
            }
            Err(e @ (TransportError::Timeout { .. } | TransportError::Connect { .. })) => {
                return Err(unreachable(e.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let body: Value = response.decode(&url)?;
        debug!("url: {} || response: {}", url, body);

        Ok(body
            .get("projects")
            .and_then(Value::as_array)
            .cloned())
    }

    /// Every project in the domain, listed with `project_token`
    pub async fn get_projects(&self, project_token: &str) -> ApiResult<Vec<Value>> {
        let url = self.url("projects")?;
        let mut headers = Headers::new();
        headers.insert(AUTH_TOKEN_HEADER.to_string(), project_token.to_string());

        match self.api.make_request(&url, &headers, None).await {
            Ok(resp) => Ok(array_field(&resp, "projects")),
            Err(e) if e.is_unreachable() => {
                warn!("Unable to get projects: {}", e);
                Err(ApiError::KeystoneUnreachable {
                    message: format!("unable to list projects @{}: {}", url, e),
                })
            }
            Err(e) => {
                warn!("Unable to get projects: {}", e);
                Err(e)
            }
        }
    }
}

/// Copy of `value` with password and secret fields masked
fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| {
                let lowered = key.to_ascii_lowercase();
                let masked = if lowered.contains("password") || lowered.contains("secret") {
                    Value::from(REDACTED)
                } else {
                    redact(value)
                };
                (key.clone(), masked)
            })
            .collect(),
        Value::Array(items) => items.iter().map(redact).collect(),
        other => other.clone(),
    }
}
