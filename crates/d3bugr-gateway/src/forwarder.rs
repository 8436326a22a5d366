//! Forwarder - relays one gateway call to its backend service
//!
//! Each call is exactly one outbound attempt. A response that arrives is
//! relayed with its status untouched; only transport failures become
//! [`GatewayError`]s.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Instant;

use d3bugr_core::routing;
use d3bugr_core::{GatewayError, GatewayResult, ServiceRegistry};
use serde::de::IgnoredAny;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::UpstreamTimeouts;

/// Request data carried to the backend; the variant decides the method
#[derive(Debug, Clone, PartialEq)]
pub enum ForwardPayload {
    /// GET with the inbound query parameters, order and duplicates kept
    Query(Vec<(String, String)>),
    /// POST with the inbound JSON body
    Json(Value),
}

impl ForwardPayload {
    pub fn method(&self) -> &'static str {
        match self {
            ForwardPayload::Query(_) => "GET",
            ForwardPayload::Json(_) => "POST",
        }
    }
}

/// One inbound call to be forwarded
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardRequest {
    pub service: String,
    /// Sub-path below the service base address, nested segments included
    pub path: String,
    pub payload: ForwardPayload,
}

impl ForwardRequest {
    /// GET `path` on `service` with the given query parameters
    pub fn get(
        service: impl Into<String>,
        path: impl Into<String>,
        query: Vec<(String, String)>,
    ) -> Self {
        Self {
            service: service.into(),
            path: path.into(),
            payload: ForwardPayload::Query(query),
        }
    }

    /// POST `body` to `path` on `service`. A `null` body is sent as `{}`.
    pub fn post(service: impl Into<String>, path: impl Into<String>, body: Value) -> Self {
        let body = match body {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        Self {
            service: service.into(),
            path: path.into(),
            payload: ForwardPayload::Json(body),
        }
    }
}

/// Upstream body as received, tagged by whether it is valid JSON.
///
/// The JSON variant keeps the original text so numbers outside the
/// `i64`/`u64`/`f64` range are relayed digit for digit.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamBody {
    Json(String),
    Text(String),
}

impl UpstreamBody {
    /// Classify a response body without building a value tree
    pub fn from_text(text: String) -> Self {
        match serde_json::from_str::<IgnoredAny>(&text) {
            Ok(_) => UpstreamBody::Json(text),
            Err(_) => UpstreamBody::Text(text),
        }
    }
}

/// A response that was actually received from the backend
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    /// Upstream status code, relayed verbatim
    pub status: u16,
    pub body: UpstreamBody,
}

/// Forwards gateway calls to registered backend services
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    registry: Arc<ServiceRegistry>,
    timeouts: UpstreamTimeouts,
}

impl Forwarder {
    pub fn new(
        client: reqwest::Client,
        registry: Arc<ServiceRegistry>,
        timeouts: UpstreamTimeouts,
    ) -> Self {
        Self {
            client,
            registry,
            timeouts,
        }
    }


    /// Forward one call and classify the outcome
    pub async fn forward(&self, request: ForwardRequest) -> GatewayResult<UpstreamResponse> {
        let ForwardRequest {
            service,
            path,
            payload,
        } = request;

        let Some(base) = self.registry.resolve(&service) else {
            debug!(service = %service, path = %path, "Unknown service");
            return Err(GatewayError::ServiceNotFound {
                service,
                path,
                available: self.registry.names(),
            });
        };

        let url = routing::target_url(base, &path);
        let method = payload.method();
        let builder = match payload {
            ForwardPayload::Query(query) => self
                .client
                .get(&url)
                .query(&query)
                .timeout(self.timeouts.get),
            ForwardPayload::Json(body) => self
                .client
                .post(&url)
                .json(&body)
                .timeout(self.timeouts.post),
        };

        debug!(service = %service, method, url = %url, "Forwarding request");
        let started = Instant::now();

        let result = async {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, text))
        }
        .await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok((status, text)) => {
                info!(
                    service = %service,
                    path = %path,
                    method,
                    status,
                    elapsed_ms,
                    "Forwarded request"
                );
                Ok(UpstreamResponse {
                    status,
                    body: UpstreamBody::from_text(text),
                })
            }
            Err(e) => {
                let err = classify(e, service, path);
                warn!(
                    error = err.kind(),
                    method,
                    elapsed_ms,
                    "{}",
                    err
                );
                Err(err)
            }
        }
    }
}

/// Map a transport failure onto the gateway error taxonomy
fn classify(err: reqwest::Error, service: String, path: String) -> GatewayError {
    if err.is_timeout() {
        GatewayError::UpstreamTimeout { service, path }
    } else if err.is_connect() {
        GatewayError::UpstreamUnavailable {
            service,
            path,
            message: error_chain(&err),
        }
    } else {
        GatewayError::UpstreamError {
            service,
            path,
            message: error_chain(&err),
        }
    }
}

/// Render an error with all of its sources
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
