//! Gateway HTTP client implementation

use std::collections::BTreeMap;
use std::time::Duration;

use d3bugr_core::ServiceDescriptor;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{ClientError, Result};
use crate::types::*;

/// Header the gateway reads the API key from
const API_KEY_HEADER: &str = "x-api-key";

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the d3bugr gateway API
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: Url,
}

impl GatewayClient {
    /// Create a new gateway client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the gateway (e.g., "http://localhost:8080")
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(base_url, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a new gateway client with custom timeouts
    pub fn with_config(
        base_url: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        let base_url = Url::parse(base_url)?;

        Ok(Self { client, base_url })
    }

    /// Create a client that sends `X-API-Key` with every request
    pub fn with_api_key(base_url: &str, api_key: &str) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        let value = reqwest::header::HeaderValue::from_str(api_key)
            .map_err(|e| ClientError::ParseError(format!("Invalid API key: {}", e)))?;
        headers.insert(API_KEY_HEADER, value);

        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .default_headers(headers)
            .build()?;

        let base_url = Url::parse(base_url)?;

        Ok(Self { client, base_url })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get a reference to the underlying HTTP client
    pub fn http_client(&self) -> &Client {
        &self.client
    }

    // =========================================================================
    // Liveness
    // =========================================================================

    /// Check gateway liveness
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<String> {
        let url = self.base_url.join("/health")?;
        let response = self.client.get(url).send().await?;

        if response.status().is_success() {
            Ok(response.text().await?)
        } else {
            Err(self.extract_error(response).await)
        }
    }

    // =========================================================================
    // Documentation
    // =========================================================================

    /// List registered services with summary metadata
    #[instrument(skip(self))]
    pub async fn list_services(&self) -> Result<BTreeMap<String, ServiceSummary>> {
        let url = self.base_url.join("/services")?;
        debug!("Listing services from {}", url);

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    /// Full descriptor for one service
    #[instrument(skip(self))]
    pub async fn get_service(&self, name: &str) -> Result<ServiceDescriptor> {
        let url = self.base_url.join(&format!("/services/{}", name))?;

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    /// Fetch any documentation route as raw JSON (e.g. `/categories`)
    #[instrument(skip(self))]
    pub async fn get_json(&self, path: &str) -> Result<Value> {
        let url = self.base_url.join(path)?;

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Health of every registered backend
    #[instrument(skip(self))]
    pub async fn status(&self) -> Result<StatusReport> {
        let url = self.base_url.join("/status")?;

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    // =========================================================================
    // Forwarding
    // =========================================================================

    /// GET `/call/{service}/{path}` with query parameters.
    ///
    /// Returns whatever the gateway answered; non-2xx statuses are not
    /// turned into errors.
    #[instrument(skip(self, query))]
    pub async fn call_get(
        &self,
        service: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<CallResponse> {
        let url = self.call_url(service, path)?;

        let response = self.client.get(url).query(query).send().await?;
        Self::call_response(response).await
    }

    /// POST a JSON body to `/call/{service}/{path}`
    #[instrument(skip(self, body))]
    pub async fn call_post(&self, service: &str, path: &str, body: &Value) -> Result<CallResponse> {
        let url = self.call_url(service, path)?;

        let response = self.client.post(url).json(body).send().await?;
        Self::call_response(response).await
    }

    fn call_url(&self, service: &str, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        let full = if path.is_empty() {
            format!("/call/{}", service)
        } else {
            format!("/call/{}/{}", service, path)
        };
        Ok(self.base_url.join(&full)?)
    }

    async fn call_response(response: reqwest::Response) -> Result<CallResponse> {
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = match serde_json::from_str::<Value>(&text) {
            Ok(value) => CallBody::Json(value),
            Err(_) => CallBody::Text(text),
        };
        Ok(CallResponse { status, body })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| ClientError::ParseError(e.to_string()))
        } else {
            Err(self.extract_error_from_status(response, status).await)
        }
    }

    /// Extract error from failed response
    async fn extract_error(&self, response: reqwest::Response) -> ClientError {
        let status = response.status();
        self.extract_error_from_status(response, status).await
    }

    async fn extract_error_from_status(
        &self,
        response: reqwest::Response,
        status: StatusCode,
    ) -> ClientError {
        match response.json::<ErrorBody>().await {
            Ok(body) => ClientError::ServerError {
                status: status.as_u16(),
                error: body.error,
                message: body.message,
            },
            Err(_) => ClientError::ServerError {
                status: status.as_u16(),
                error: "unknown".to_string(),
                message: format!("HTTP {}", status),
            },
        }
    }
}
