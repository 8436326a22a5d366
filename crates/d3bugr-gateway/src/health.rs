//! Health aggregation across every registered service
//!
//! All probes for one snapshot are issued together and joined, each under
//! its own timeout, so a hung backend costs at most one probe budget and
//! never hides the status of the others.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use d3bugr_core::routing;
use d3bugr_core::ServiceRegistry;
use futures::future::join_all;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, info};

/// Default path probed on every backend
pub const DEFAULT_HEALTH_PATH: &str = "/health";

/// Probe outcome for one service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Answered 200
    Online,
    /// Answered with any other status
    Error,
    /// No answer (timeout, refused, or any other transport failure)
    Offline,
}

/// Status entry for one service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    pub url: String,
}

/// Per-service health, one entry per registry entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    pub services: BTreeMap<String, ServiceHealth>,
}

/// Counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HealthSummary {
    pub online: usize,
    pub error: usize,
    pub offline: usize,
    pub total: usize,
}

impl HealthSnapshot {
    pub fn summary(&self) -> HealthSummary {
        let mut summary = HealthSummary {
            total: self.services.len(),
            ..Default::default()
        };
        for health in self.services.values() {
            match health.status {
                HealthStatus::Online => summary.online += 1,
                HealthStatus::Error => summary.error += 1,
                HealthStatus::Offline => summary.offline += 1,
            }
        }
        summary
    }
}

/// Probes every registered service concurrently
#[derive(Debug, Clone)]
pub struct HealthAggregator {
    client: reqwest::Client,
    registry: Arc<ServiceRegistry>,
    timeout: Duration,
    health_path: String,
}

impl HealthAggregator {
    pub fn new(
        client: reqwest::Client,
        registry: Arc<ServiceRegistry>,
        timeout: Duration,
        health_path: impl Into<String>,
    ) -> Self {
        Self {
            client,
            registry,
            timeout,
            health_path: health_path.into(),
        }
    }

    /// Probe every registered service and collect the results
    pub async fn snapshot(&self) -> HealthSnapshot {
        let probes = self.registry.iter().map(|(name, base)| async move {
            let status = self.probe(name, base).await;
            (
                name.to_string(),
                ServiceHealth {
                    status,
                    url: base.to_string(),
                },
            )
        });

        let services: BTreeMap<String, ServiceHealth> =
            join_all(probes).await.into_iter().collect();
        let snapshot = HealthSnapshot { services };

        let summary = snapshot.summary();
        info!(
            online = summary.online,
            error = summary.error,
            offline = summary.offline,
            "Health snapshot collected"
        );
        snapshot
    }

    async fn probe(&self, name: &str, base: &str) -> HealthStatus {
        let url = routing::health_url(base, &self.health_path);
        let request = self.client.get(&url).timeout(self.timeout).send();

        // The outer timeout also bounds anything reqwest does before the
        // request timer starts (DNS resolution included).
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(response)) if response.status() == StatusCode::OK => HealthStatus::Online,
            Ok(Ok(response)) => {
                debug!(
                    service = %name,
                    status = response.status().as_u16(),
                    "Health probe returned non-200"
                );
                HealthStatus::Error
            }
            Ok(Err(e)) => {
                debug!(service = %name, error = %e, "Health probe failed");
                HealthStatus::Offline
            }
            Err(_) => {
                debug!(service = %name, "Health probe timed out");
                HealthStatus::Offline
            }
        }
    }
}
