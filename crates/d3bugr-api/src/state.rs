//! Application state for the gateway API
//!
//! Built once at startup and shared read-only by every handler.

use std::sync::Arc;

use d3bugr_core::{DescriptorError, DescriptorStore, ServiceRegistry};
use d3bugr_gateway::{Forwarder, HealthAggregator, UpstreamTimeouts, DEFAULT_HEALTH_PATH};

use crate::auth::AccessGate;

/// Tunables applied when building [`AppState`]
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub timeouts: UpstreamTimeouts,
    /// Path probed on each backend by `/status`
    pub health_path: String,
    /// Shared secret; `None` leaves the gateway open
    pub api_key: Option<String>,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            timeouts: UpstreamTimeouts::default(),
            health_path: DEFAULT_HEALTH_PATH.to_string(),
            api_key: None,
        }
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    store: Arc<DescriptorStore>,
    registry: Arc<ServiceRegistry>,
    forwarder: Forwarder,
    health: HealthAggregator,
    gate: Arc<AccessGate>,
}

impl AppState {
    /// Derive the registry from `store` and wire the outbound components
    /// around one shared HTTP client
    pub fn new(
        store: DescriptorStore,
        client: reqwest::Client,
        options: GatewayOptions,
    ) -> Result<Self, DescriptorError> {
        let registry = Arc::new(ServiceRegistry::from_store(&store)?);
        let forwarder = Forwarder::new(client.clone(), registry.clone(), options.timeouts);
        let health = HealthAggregator::new(
            client,
            registry.clone(),
            options.timeouts.health,
            options.health_path,
        );

        Ok(Self {
            store: Arc::new(store),
            registry,
            forwarder,
            health,
            gate: Arc::new(AccessGate::new(options.api_key)),
        })
    }

    pub fn store(&self) -> &DescriptorStore {
        &self.store
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn forwarder(&self) -> &Forwarder {
        &self.forwarder
    }

    pub fn health(&self) -> &HealthAggregator {
        &self.health
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }
}
