//! # Vigil OpenStack
//!
//! API clients used by the OpenStack controller check.
//!
//! Every client wraps an [`AbstractApi`], which authenticates requests with
//! `X-Auth-Token`, memoizes GET responses for the lifetime of the client and
//! classifies failures into [`ApiError`] variants the check can act on.
//! Clients are meant to be rebuilt on every check run, with a fresh token.
//!
//! - [`ComputeApi`]: hypervisors, aggregates, servers, flavors, limits
//! - [`NeutronApi`]: networks
//! - [`KeystoneApi`]: tokens and projects
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use vigil_openstack::{ApiConfig, ComputeApi, InMemoryTransport};
//!
//! # tokio_test::block_on(async {
//! let transport = InMemoryTransport::new();
//! transport.get_json(
//!     "http://nova:8774/v2.1/servers/detail",
//!     200,
//!     json!({"servers": [{"id": "a"}, {"id": "b"}]}),
//! );
//!
//! let nova = ComputeApi::with_transport(
//!     "http://nova:8774/v2.1",
//!     "token",
//!     ApiConfig::default(),
//!     Arc::new(transport),
//! )
//! .unwrap();
//!
//! let servers = nova.get_servers_detail(None).await.unwrap();
//! assert_eq!(servers.len(), 2);
//! # });
//! ```

pub mod api;
pub mod cache;
pub mod compute;
pub mod errors;
pub mod keystone;
pub mod neutron;
pub mod settings;
pub mod transport;

pub use api::{AbstractApi, AUTH_TOKEN_HEADER};
pub use cache::{ApiRequestCache, CacheKey, CacheStats};
pub use compute::ComputeApi;
pub use errors::{ApiError, ApiResult, TransportError};
pub use keystone::{KeystoneApi, KeystoneToken, SUBJECT_TOKEN_HEADER};
pub use neutron::NeutronApi;
pub use settings::{
    ApiConfig, ProxySettings, DEFAULT_API_REQUEST_TIMEOUT, DEFAULT_KEYSTONE_API_VERSION,
    DEFAULT_MAX_RETRY, DEFAULT_NEUTRON_API_VERSION, DEFAULT_PAGINATED_LIMIT, UNSCOPED_AUTH,
};
pub use transport::{
    Headers, HttpMethod, HttpRequest, HttpResponse, HttpTransport, InMemoryTransport,
    QueryParams, ReqwestTransport,
};
