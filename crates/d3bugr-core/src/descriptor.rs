//! Descriptor document models
//!
//! One JSON document per backend service, plus an optional `meta`
//! document with gateway-wide context. Fields the gateway reasons about are
//! typed; anything else in the file is kept in `extra` so the documentation
//! endpoints re-emit the document as written.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Description of one backend service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Service name used for routing (`/call/{service}/...`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Base address of the backend (scheme + host, no path)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Human-readable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Tool category (recon, scanning, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<EndpointDescriptor>,
    /// MCP tool names exposed for this service
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mcp_tools: Vec<String>,
    /// Free-form usage examples
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServiceDescriptor {
    /// Routing pair, present only when the descriptor names both the
    /// service and its address
    pub fn routing_entry(&self) -> Option<(&str, &str)> {
        match (self.service.as_deref(), self.url.as_deref()) {
            (Some(service), Some(url)) => Some((service, url)),
            _ => None,
        }
    }

    /// Category, falling back to `other`
    pub fn category_or_other(&self) -> &str {
        self.category.as_deref().unwrap_or("other")
    }
}

/// One operation exposed by a backend service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    /// Path template relative to the service base address
    #[serde(default)]
    pub path: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterDescriptor>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EndpointDescriptor {
    /// Compact `"METHOD path"` form
    pub fn signature(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

fn default_method() -> String {
    "GET".to_string()
}

/// Parameter accepted by an endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Gateway-wide documentation (`meta.json`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_context: Option<Value>,
    /// Hunting workflow phases
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_usage: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
