//! Response types for the gateway API

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// Entry of `GET /services`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceSummary {
    pub name: String,
    pub category: String,
    pub description: String,
    pub endpoints: Vec<String>,
}

/// Entry of `GET /status`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceStatus {
    /// `online`, `error` or `offline`
    pub status: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StatusSummary {
    pub online: usize,
    pub error: usize,
    pub offline: usize,
    pub total: usize,
}

/// `GET /status` response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusReport {
    pub services: BTreeMap<String, ServiceStatus>,
    pub summary: StatusSummary,
}

/// Structured error body returned by the gateway
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub available: Option<Vec<String>>,
}

/// Body of a `/call` response
#[derive(Debug, Clone, PartialEq)]
pub enum CallBody {
    Json(Value),
    Text(String),
}

/// Raw outcome of a `/call` request: whatever the gateway answered,
/// relayed upstream responses and gateway errors alike
#[derive(Debug, Clone, PartialEq)]
pub struct CallResponse {
    pub status: u16,
    pub body: CallBody,
}

impl CallResponse {
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            CallBody::Json(value) => Some(value),
            CallBody::Text(_) => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.body {
            CallBody::Text(text) => Some(text),
            CallBody::Json(_) => None,
        }
    }

    /// Parse the body as a gateway error, if it is one
    pub fn error(&self) -> Option<ErrorBody> {
        self.json()
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}
