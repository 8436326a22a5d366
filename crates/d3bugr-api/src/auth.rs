//! Shared-secret access gate
//!
//! Checks the `X-API-Key` header (or the `api_key` query parameter) on
//! every route except `/health`. With no secret configured every request
//! passes through.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use d3bugr_core::GatewayError;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";
/// Query parameter carrying the API key
pub const API_KEY_PARAM: &str = "api_key";

/// Optional shared secret
#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    secret: Option<String>,
}

impl AccessGate {
    /// Gate that lets everything through
    pub fn open() -> Self {
        Self::default()
    }

    /// Gate for an optional secret; an empty secret counts as none
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Check a caller-supplied key against the configured secret
    pub fn authorize(&self, provided: Option<&str>) -> Result<(), GatewayError> {
        let Some(expected) = self.secret.as_deref() else {
            return Ok(());
        };
        match provided {
            None => Err(GatewayError::AuthMissing),
            Some(key) if key == expected => Ok(()),
            Some(_) => Err(GatewayError::AuthInvalid),
        }
    }

    /// Drop the gateway credential from a query about to be forwarded.
    ///
    /// Only applies when a secret is configured; in open mode `api_key`
    /// means nothing to the gateway and is forwarded like any parameter.
    pub fn strip_credential(&self, query: Vec<(String, String)>) -> Vec<(String, String)> {
        if !self.is_enabled() {
            return query;
        }
        query
            .into_iter()
            .filter(|(key, _)| key != API_KEY_PARAM)
            .collect()
    }
}

/// Extract the caller's key. The header wins over the query parameter.
pub fn provided_key(headers: &HeaderMap, query: Option<&str>) -> Option<String> {
    if let Some(value) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(value.to_string());
    }
    let query = query?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == API_KEY_PARAM)
        .map(|(_, value)| value.into_owned())
}

/// Axum middleware applying the access gate.
///
/// Installed with `route_layer` on every route except `/health`.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = provided_key(request.headers(), request.uri().query());

    if let Err(e) = state.gate().authorize(provided.as_deref()) {
        tracing::warn!(
            path = %request.uri().path(),
            reason = e.kind(),
            "Rejected request"
        );
        return Err(e.into());
    }

    Ok(next.run(request).await)
}
