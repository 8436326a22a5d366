//! d3bugr-gateway - Request forwarding and health aggregation
//!
//! This crate owns every outbound call the gateway makes to the backend
//! tool services:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       d3bugr gateway                         │
//! │                                                              │
//! │   /call/{service}/{path}          /status                    │
//! │           │                          │                       │
//! │           ▼                          ▼                       │
//! │   ┌───────────────┐        ┌───────────────────┐             │
//! │   │   Forwarder   │        │ HealthAggregator  │             │
//! │   │ one attempt,  │        │ fan-out / fan-in, │             │
//! │   │ GET 60s       │        │ 5s per probe      │             │
//! │   │ POST 600s     │        │                   │             │
//! │   └───────┬───────┘        └─────────┬─────────┘             │
//! │           │      ServiceRegistry     │                       │
//! │           └────────────┬─────────────┘                       │
//! └────────────────────────┼─────────────────────────────────────┘
//!                          ▼
//!          ┌─────────┐ ┌─────────┐ ┌─────────┐
//!          │ nuclei  │ │  httpx  │ │  ffuf   │  ...
//!          └─────────┘ └─────────┘ └─────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use d3bugr_gateway::{http_client, ForwardRequest, Forwarder, UpstreamTimeouts};
//!
//! let registry = Arc::new(ServiceRegistry::from_store(&store)?);
//! let client = http_client()?;
//! let forwarder = Forwarder::new(client, registry, UpstreamTimeouts::default());
//!
//! let body = serde_json::json!({"target": "example.com"});
//! let response = forwarder
//!     .forward(ForwardRequest::post("nuclei", "scan", body))
//!     .await?;
//! ```

mod forwarder;
mod health;

pub use forwarder::{ForwardPayload, ForwardRequest, Forwarder, UpstreamBody, UpstreamResponse};
pub use health::{
    HealthAggregator, HealthSnapshot, HealthStatus, HealthSummary, ServiceHealth,
    DEFAULT_HEALTH_PATH,
};

use std::time::Duration;

// Re-export core types for convenience
pub use d3bugr_core::{GatewayError, GatewayResult, ServiceRegistry};

/// Default budget for forwarded GET calls
pub const DEFAULT_GET_TIMEOUT: Duration = Duration::from_secs(60);
/// Default budget for forwarded POST calls (long-running scans)
pub const DEFAULT_POST_TIMEOUT: Duration = Duration::from_secs(600);
/// Default budget for a single health probe
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout budgets for outbound calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamTimeouts {
    pub get: Duration,
    pub post: Duration,
    pub health: Duration,
}

impl Default for UpstreamTimeouts {
    fn default() -> Self {
        Self {
            get: DEFAULT_GET_TIMEOUT,
            post: DEFAULT_POST_TIMEOUT,
            health: DEFAULT_HEALTH_TIMEOUT,
        }
    }
}

/// Build the shared outbound HTTP client.
///
/// No client-wide timeout is set; each call applies its own budget.
pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("d3bugr-gateway/", env!("CARGO_PKG_VERSION")))
        .build()
}
