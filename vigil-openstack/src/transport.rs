//! HTTP transport seam.
//!
//! API clients build [`HttpRequest`]s and hand them to an [`HttpTransport`].
//! [`ReqwestTransport`] talks to real endpoints; [`InMemoryTransport`]
//! serves scripted responses and records every request it receives.

use crate::{ApiConfig, ApiError, ApiResult, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Request headers, ordered for deterministic cache keys
pub type Headers = BTreeMap<String, String>;

/// Query parameters, ordered for deterministic cache keys
pub type QueryParams = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Headers,
    pub params: Option<QueryParams>,
    pub body: Option<String>,
    pub timeout: Duration,
}

impl HttpRequest {
    fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Headers::new(),
            params: None,
            body: None,
            timeout: crate::DEFAULT_API_REQUEST_TIMEOUT,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_params(mut self, params: Option<QueryParams>) -> Self {
        self.params = params;
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Value of query parameter `name`, if set
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.as_ref()?.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are stored lowercased
    pub headers: Headers,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: body.into(),
        }
    }

    /// A response whose body is the serialized `body`
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Decode the body as JSON
    pub fn decode<T: DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        serde_json::from_str(&self.body).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Sends HTTP requests on behalf of the API clients.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send `request` and return the response, whatever its status.
    ///
    /// Only failures that prevent a response from being received are
    /// returned as errors.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Transport backed by a shared `reqwest` client.
///
/// TLS verification and proxies are fixed when the client is built.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let mut builder = reqwest::Client::builder().danger_accept_invalid_certs(!config.ssl_verify);

        if let Some(http) = &config.proxies.http {
            let proxy = reqwest::Proxy::http(http)
                .map_err(|e| ApiError::config(format!("invalid http proxy {}: {}", http, e)))?;
            builder = builder.proxy(proxy);
        }
        if let Some(https) = &config.proxies.https {
            let proxy = reqwest::Proxy::https(https)
                .map_err(|e| ApiError::config(format!("invalid https proxy {}: {}", https, e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ApiError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

fn classify(url: &str, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else if err.is_connect() {
        TransportError::Connect {
            url: url.to_string(),
            reason: err.to_string(),
        }
    } else {
        TransportError::Other {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url;
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(params) = &request.params {
            builder = builder.query(params);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| classify(&url, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(|e| classify(&url, e))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

type Reply = Result<HttpResponse, TransportError>;

#[derive(Debug)]
struct Route {
    method: HttpMethod,
    url: String,
    params: Option<QueryParams>,
    replies: VecDeque<Reply>,
}

#[derive(Debug, Default)]
struct TransportState {
    routes: Vec<Route>,
    requests: Vec<HttpRequest>,
}

/// Transport serving scripted replies from memory.
///
/// Replies are registered per method and URL, optionally restricted to an
/// exact set of query parameters. Routes with matching parameters win over
/// routes registered without parameters. Each route hands out its replies
/// in order and repeats the last one forever. Requests without a route fail
/// with [`TransportError::Connect`]. Clones share routes and request log.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransport {
    state: Arc<Mutex<TransportState>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `method url` (any query parameters)
    pub fn reply(&self, method: HttpMethod, url: &str, reply: Reply) -> &Self {
        self.push(method, url, None, reply);
        self
    }

    /// Queue a reply for `method url` with exactly `params`
    pub fn reply_with_params(
        &self,
        method: HttpMethod,
        url: &str,
        params: QueryParams,
        reply: Reply,
    ) -> &Self {
        self.push(method, url, Some(params), reply);
        self
    }

    /// Queue a JSON reply for `GET url`
    pub fn get_json(&self, url: &str, status: u16, body: serde_json::Value) -> &Self {
        self.reply(HttpMethod::Get, url, Ok(HttpResponse::json(status, &body)))
    }

    fn push(&self, method: HttpMethod, url: &str, params: Option<QueryParams>, reply: Reply) {
        let mut state = self.state.lock();
        let existing = state
            .routes
            .iter_mut()
            .find(|route| route.method == method && route.url == url && route.params == params);

        match existing {
            Some(route) => route.replies.push_back(reply),
            None => state.routes.push(Route {
                method,
                url: url.to_string(),
                params,
                replies: VecDeque::from([reply]),
            }),
        }
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state.lock().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().requests.len()
    }

    /// Requests received for `url`, in order
    pub fn requests_to(&self, url: &str) -> Vec<HttpRequest> {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|request| request.url == url)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HttpTransport for InMemoryTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut state = self.state.lock();
        state.requests.push(request.clone());

        let matches = |route: &Route, exact: bool| {
            route.method == request.method
                && route.url == request.url
                && if exact {
                    route.params.is_some() && route.params == request.params
                } else {
                    route.params.is_none()
                }
        };
        let position = state
            .routes
            .iter()
            .position(|route| matches(route, true))
            .or_else(|| state.routes.iter().position(|route| matches(route, false)));

        let Some(position) = position else {
            debug!("No scripted reply for {:?} {}", request.method, request.url);
            return Err(TransportError::Connect {
                url: request.url,
                reason: "no route to host".to_string(),
            });
        };

        let replies = &mut state.routes[position].replies;
        let reply = if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        };

        reply.unwrap_or_else(|| {
            Err(TransportError::Other {
                url: request.url.clone(),
                reason: "route has no replies".to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_in_memory_replies_in_order_then_repeat() {
        let transport = InMemoryTransport::new();
        transport
            .get_json("http://nova/servers", 200, json!({"n": 1}))
            .get_json("http://nova/servers", 200, json!({"n": 2}));

        let mut seen = Vec::new();
        for _ in 0..3 {
            let response = transport
                .send(HttpRequest::get("http://nova/servers"))
                .await
                .unwrap();
            let body: serde_json::Value = response.decode("http://nova/servers").unwrap();
            seen.push(body["n"].as_i64().unwrap());
        }

        assert_eq!(seen, vec![1, 2, 2]);
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn test_in_memory_prefers_exact_params() {
        let transport = InMemoryTransport::new();
        let mut params = QueryParams::new();
        params.insert("marker".into(), "b".into());

        transport.get_json("http://nova/flavors", 200, json!({"page": "first"}));
        transport.reply_with_params(
            HttpMethod::Get,
            "http://nova/flavors",
            params.clone(),
            Ok(HttpResponse::json(200, &json!({"page": "second"}))),
        );

        let second = transport
            .send(HttpRequest::get("http://nova/flavors").with_params(Some(params)))
            .await
            .unwrap();
        assert_eq!(second.body, r#"{"page":"second"}"#);

        let first = transport
            .send(HttpRequest::get("http://nova/flavors"))
            .await
            .unwrap();
        assert_eq!(first.body, r#"{"page":"first"}"#);
    }

    #[tokio::test]
    async fn test_in_memory_unknown_route() {
        let transport = InMemoryTransport::new();
        let result = transport.send(HttpRequest::post("http://nowhere")).await;
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }

    #[test]
    fn test_response_helpers() {
        let response = HttpResponse::new(201, "{}").with_header("X-Subject-Token", "abc");
        assert!(response.is_success());
        assert_eq!(response.header("x-subject-token"), Some("abc"));
        assert!(!HttpResponse::new(409, "").is_success());
    }
}
