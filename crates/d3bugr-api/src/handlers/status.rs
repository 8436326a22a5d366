//! Backend health status handler

use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use d3bugr_gateway::{HealthSummary, ServiceHealth};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct StatusResponse {
    pub services: BTreeMap<String, ServiceHealth>,
    pub summary: HealthSummary,
}

/// GET /status
/// Probe every registered service; recomputed on every call
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let snapshot = state.health().snapshot().await;
    let summary = snapshot.summary();
    Json(StatusResponse {
        services: snapshot.services,
        summary,
    })
}
