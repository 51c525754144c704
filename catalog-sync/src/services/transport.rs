//! GraphQL transport
//!
//! One authenticated POST per call. The response body is returned on any
//! HTTP status; interpretation is left to the envelope decoder.

use async_trait::async_trait;
use catalog_common::config::StoreEndpoint;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::error::SyncError;
use crate::models::{GraphqlRequest, GraphqlResponse};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Sends a GraphQL request and returns the raw response body
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    async fn send(
        &self,
        endpoint: &StoreEndpoint,
        request: &GraphqlRequest,
    ) -> Result<Vec<u8>, SyncError>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    http_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, SyncError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl GraphqlTransport for HttpTransport {
    async fn send(
        &self,
        endpoint: &StoreEndpoint,
        request: &GraphqlRequest,
    ) -> Result<Vec<u8>, SyncError> {
        let response = self
            .http_client
            .post(&endpoint.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(ACCESS_TOKEN_HEADER, &endpoint.access_token)
            .json(request)
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        let status = response.status();
        debug!(endpoint = %endpoint.endpoint, status = %status, "GraphQL response received");

        let body = response
            .bytes()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        Ok(body.to_vec())
    }
}

/// Send a request and decode its `data` into `T`
pub async fn execute<T: DeserializeOwned>(
    transport: &dyn GraphqlTransport,
    endpoint: &StoreEndpoint,
    request: &GraphqlRequest,
) -> Result<T, SyncError> {
    let body = transport.send(endpoint, request).await?;
    let response = GraphqlResponse::<T>::decode(&body)?;

    if let Some(cost) = response.extensions.as_ref().and_then(|e| e.cost.as_ref()) {
        debug!(
            actual_cost = ?cost.actual_query_cost,
            available = ?cost.throttle_status.as_ref().map(|t| t.currently_available),
            "Query cost"
        );
    }

    response.into_data()
}
