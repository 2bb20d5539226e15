//! Nova (compute) API client.

use crate::api::array_field;
use crate::{AbstractApi, ApiConfig, ApiError, ApiResult, HttpTransport, QueryParams};
use serde_json::{Map, Value};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, warn};

/// Client for the compute endpoints used by the OpenStack check
pub struct ComputeApi {
    api: AbstractApi,
    paginated_limit: usize,
}

impl ComputeApi {
    pub fn new(
        endpoint: impl Into<String>,
        auth_token: impl Into<String>,
        config: ApiConfig,
    ) -> ApiResult<Self> {
        let paginated_limit = config.paginated_limit;
        Ok(Self {
            api: AbstractApi::new(endpoint, auth_token, config)?,
            paginated_limit,
        })
    }

    pub fn with_transport(
        endpoint: impl Into<String>,
        auth_token: impl Into<String>,
        config: ApiConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> ApiResult<Self> {
        config.validate()?;
        let paginated_limit = config.paginated_limit;
        Ok(Self {
            api: AbstractApi::with_transport(endpoint, auth_token, config, transport),
            paginated_limit,
        })
    }

    pub fn api(&self) -> &AbstractApi {
        &self.api
    }

    fn url(&self, path: impl Display) -> String {
        format!("{}/{}", self.api.endpoint(), path)
    }

    async fn get(&self, url: &str, params: Option<&QueryParams>) -> ApiResult<Value> {
        self.api
            .make_request(url, self.api.auth_headers(), params)
            .await
    }

    /// Uptime string reported for hypervisor `hyp_id`
    pub async fn get_os_hypervisor_uptime(&self, hyp_id: impl Display) -> ApiResult<Option<String>> {
        let url = self.url(format_args!("os-hypervisors/{}/uptime", hyp_id));
        let resp = self.get(&url, None).await?;
        Ok(resp
            .get("hypervisor")
            .and_then(|hypervisor| hypervisor.get("uptime"))
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    pub async fn get_os_aggregates(&self) -> ApiResult<Vec<Value>> {
        let resp = self.get(&self.url("os-aggregates"), None).await?;
        Ok(array_field(&resp, "aggregates"))
    }

    pub async fn get_os_hypervisors_detail(&self) -> ApiResult<Vec<Value>> {
        let resp = self.get(&self.url("os-hypervisors/detail"), None).await?;
        Ok(array_field(&resp, "hypervisors"))
    }

    /// Every server visible with `query_params`, across all pages
    pub async fn get_servers_detail(&self, query_params: Option<QueryParams>) -> ApiResult<Vec<Value>> {
        self.get_paginated_list(&self.url("servers/detail"), "servers", query_params)
            .await
    }

    pub async fn get_server_diagnostics(&self, server_id: impl Display) -> ApiResult<Value> {
        let url = self.url(format_args!("servers/{}/diagnostics", server_id));
        self.get(&url, None).await
    }

    /// Absolute limits of project `tenant_id`
    pub async fn get_project_limits(&self, tenant_id: &str) -> ApiResult<Map<String, Value>> {
        let mut params = QueryParams::new();
        params.insert("tenant_id".to_string(), tenant_id.to_string());

        let resp = self.get(&self.url("limits"), Some(&params)).await?;
        Ok(resp
            .get("limits")
            .and_then(|limits| limits.get("absolute"))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default())
    }

    /// Every flavor visible with `query_params`, across all pages
    pub async fn get_flavors_detail(&self, query_params: Option<QueryParams>) -> ApiResult<Vec<Value>> {
        self.get_paginated_list(&self.url("flavors/detail"), "flavors", query_params)
            .await
    }

    /// Collect the `field` array of a marker-paginated endpoint.
    ///
    /// A page holding exactly as many items as were asked for is taken to
    /// mean more data may follow, so the next page is requested with the
    /// last item's id as `marker`. A failed continuation page is retried up
    /// to `max_retry` attempts in total, halving `limit` after each failure.
    /// Every retry asks for fewer items than the attempt before it, so once
    /// `limit` is down to 1 there is no further retry. The last failure is
    /// returned as is.
    pub async fn get_paginated_list(
        &self,
        url: &str,
        field: &str,
        query_params: Option<QueryParams>,
    ) -> ApiResult<Vec<Value>> {
        let max_retry = self.api.config().max_retry;
        let mut params = query_params.unwrap_or_default();
        let mut limit = self.paginated_limit;
        params.insert("limit".to_string(), limit.to_string());

        let resp = self.get(url, Some(&params)).await?;
        let mut result = array_field(&resp, field);
        let mut page_len = result.len();

        while page_len == limit {
            let marker = result
                .last()
                .and_then(item_id)
                .ok_or_else(|| ApiError::MissingMarker {
                    url: url.to_string(),
                })?;
            params.insert("marker".to_string(), marker);
            limit = self.paginated_limit;

            let mut attempt = 0;
            let page = loop {
                params.insert("limit".to_string(), limit.to_string());
                match self.get(url, Some(&params)).await {
                    Ok(resp) => break array_field(&resp, field),
                    Err(e) => {
                        attempt += 1;
                        if attempt >= max_retry || limit <= 1 {
                            return Err(e);
                        }
                        let shrunk = limit / 2;
                        warn!(
                            "Paginated request to {} failed: {}, retrying with limit {} ({}/{})",
                            url, e, shrunk, attempt, max_retry
                        );
                        limit = shrunk;
                    }
                }
            };

            page_len = page.len();
            result.extend(page);
        }

        debug!("Collected {} {} from {}", result.len(), field, url);
        Ok(result)
    }
}

fn item_id(item: &Value) -> Option<String> {
    match item.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
