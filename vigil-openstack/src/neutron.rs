//! Neutron (network) API client.

use crate::api::array_field;
use crate::{AbstractApi, ApiConfig, ApiResult, HttpTransport};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

pub struct NeutronApi {
    api: AbstractApi,
}

impl NeutronApi {
    pub fn new(
        endpoint: impl Into<String>,
        auth_token: impl Into<String>,
        config: ApiConfig,
    ) -> ApiResult<Self> {
        Ok(Self {
            api: AbstractApi::new(endpoint, auth_token, config)?,
        })
    }

    pub fn with_transport(
        endpoint: impl Into<String>,
        auth_token: impl Into<String>,
        config: ApiConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> ApiResult<Self> {
        config.validate()?;
        Ok(Self {
            api: AbstractApi::with_transport(endpoint, auth_token, config, transport),
        })
    }

    pub fn api(&self) -> &AbstractApi {
        &self.api
    }

    /// Every network visible to the token
    pub async fn get_networks(&self) -> ApiResult<Vec<Value>> {
        let url = format!(
            "{}/{}/networks",
            self.api.endpoint(),
            self.api.config().neutron_api_version
        );

        match self
            .api
            .make_request(&url, self.api.auth_headers(), None)
            .await
        {
            Ok(resp) => Ok(array_field(&resp, "networks")),
            Err(e) => {
                warn!("Unable to get the list of all network ids: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ApiError, InMemoryTransport};
    use serde_json::json;

    #[tokio::test]
    async fn test_networks_use_configured_version() {
        let transport = InMemoryTransport::new();
        transport.get_json(
            "http://neutron:9696/v2.0/networks",
            200,
            json!({"networks": [{"id": "n1", "name": "public"}]}),
        );
        let api = NeutronApi::with_transport(
            "http://neutron:9696",
            "token",
            ApiConfig::default(),
            Arc::new(transport.clone()),
        )
        .unwrap();

        let networks = api.get_networks().await.unwrap();
        assert_eq!(networks.len(), 1);
        assert_eq!(networks[0]["name"], "public");
    }

    #[tokio::test]
    async fn test_networks_failure_is_propagated() {
        let transport = InMemoryTransport::new();
        transport.get_json("http://neutron:9696/v2.0/networks", 401, json!({}));
        let api = NeutronApi::with_transport(
            "http://neutron:9696",
            "token",
            ApiConfig::default(),
            Arc::new(transport),
        )
        .unwrap();

        assert!(matches!(
            api.get_networks().await,
            Err(ApiError::AuthenticationNeeded)
        ));
    }
}
