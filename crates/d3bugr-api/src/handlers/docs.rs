//! Documentation and discovery handlers
//!
//! Read-only projections of the descriptor store.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use d3bugr_core::{MetaDocument, ServiceDescriptor};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// Prefix of the MCP tool names advertised by `/mcp`
pub const MCP_PREFIX: &str = "mcp__d3bugr__";

#[derive(Serialize)]
pub struct IndexResponse<'a> {
    pub meta: MetaDocument,
    pub services: &'a BTreeMap<String, ServiceDescriptor>,
}

#[derive(Serialize)]
pub struct ContextResponse {
    pub llm_context: Value,
    pub workflow: Value,
    pub gateway_usage: Value,
}

#[derive(Serialize)]
pub struct ServiceSummary {
    pub name: String,
    pub category: String,
    pub description: String,
    pub endpoints: Vec<String>,
}

#[derive(Serialize)]
pub struct EndpointSummary {
    pub service: String,
    pub method: String,
    pub path: String,
    pub description: String,
}

#[derive(Serialize)]
pub struct McpResponse {
    pub prefix: &'static str,
    pub by_service: BTreeMap<String, Vec<String>>,
    pub all: Vec<String>,
}

#[derive(Serialize)]
pub struct FullDocs<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<&'a MetaDocument>,
    #[serde(flatten)]
    pub documents: &'a BTreeMap<String, ServiceDescriptor>,
}

fn or_empty(value: Option<&Value>) -> Value {
    value.cloned().unwrap_or_else(|| json!({}))
}

/// GET /
/// Full documentation: meta plus every service document
pub async fn index(State(state): State<AppState>) -> Response {
    let store = state.store();
    Json(IndexResponse {
        meta: store.meta().cloned().unwrap_or_default(),
        services: store.documents(),
    })
    .into_response()
}

/// GET /meta
pub async fn meta(State(state): State<AppState>) -> Json<MetaDocument> {
    Json(state.store().meta().cloned().unwrap_or_default())
}

/// GET /context
/// LLM context: what, why and when to use each tool
pub async fn context(State(state): State<AppState>) -> Json<ContextResponse> {
    let meta = state.store().meta();
    Json(ContextResponse {
        llm_context: or_empty(meta.and_then(|m| m.llm_context.as_ref())),
        workflow: or_empty(meta.and_then(|m| m.workflow.as_ref())),
        gateway_usage: or_empty(meta.and_then(|m| m.gateway_usage.as_ref())),
    })
}

/// GET /workflow
/// Hunting workflow phases
pub async fn workflow(State(state): State<AppState>) -> Json<Value> {
    Json(or_empty(
        state.store().meta().and_then(|m| m.workflow.as_ref()),
    ))
}

/// GET /services
/// Services with summary metadata
pub async fn list_services(
    State(state): State<AppState>,
) -> Json<BTreeMap<String, ServiceSummary>> {
    let services = state
        .store()
        .services()
        .map(|(service, doc)| {
            (
                service.to_string(),
                ServiceSummary {
                    name: doc.name.clone().unwrap_or_default(),
                    category: doc.category.clone().unwrap_or_default(),
                    description: doc.description.clone().unwrap_or_default(),
                    endpoints: doc.endpoints.iter().map(|ep| ep.path.clone()).collect(),
                },
            )
        })
        .collect();
    Json(services)
}

/// GET /services/{name}
/// Full descriptor for one service
pub async fn get_service(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ServiceDescriptor>, ApiError> {
    match state.store().find_service(&name) {
        Some(doc) => Ok(Json(doc.clone())),
        None => Err(ApiError::UnknownService {
            service: name,
            available: state.registry().names(),
        }),
    }
}

/// GET /endpoints
/// Every endpoint across all services
pub async fn endpoints(State(state): State<AppState>) -> Json<Vec<EndpointSummary>> {
    let eps = state
        .store()
        .services()
        .flat_map(|(service, doc)| {
            doc.endpoints.iter().map(move |ep| EndpointSummary {
                service: service.to_string(),
                method: ep.method.clone(),
                path: ep.path.clone(),
                description: ep.description.clone().unwrap_or_default(),
            })
        })
        .collect();
    Json(eps)
}

/// GET /mcp
/// MCP tool mappings
pub async fn mcp(State(state): State<AppState>) -> Json<McpResponse> {
    let by_service: BTreeMap<String, Vec<String>> = state
        .store()
        .services()
        .filter(|(_, doc)| !doc.mcp_tools.is_empty())
        .map(|(service, doc)| (service.to_string(), doc.mcp_tools.clone()))
        .collect();
    let all = by_service.values().flatten().cloned().collect();

    Json(McpResponse {
        prefix: MCP_PREFIX,
        by_service,
        all,
    })
}

/// GET /examples
/// Usage examples, each tagged with its service
pub async fn examples(State(state): State<AppState>) -> Json<Vec<Value>> {
    let mut out = Vec::new();
    for (service, doc) in state.store().services() {
        for example in &doc.examples {
            let tagged = match example {
                Value::Object(fields) => {
                    let mut fields = fields.clone();
                    fields.insert("service".to_string(), json!(service));
                    Value::Object(fields)
                }
                other => {
                    let mut fields = Map::new();
                    fields.insert("service".to_string(), json!(service));
                    fields.insert("example".to_string(), other.clone());
                    Value::Object(fields)
                }
            };
            out.push(tagged);
        }
    }
    Json(out)
}

/// GET /categories
/// Services grouped by category
pub async fn categories(State(state): State<AppState>) -> Json<BTreeMap<String, Vec<String>>> {
    let mut cats: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (service, doc) in state.store().services() {
        cats.entry(doc.category_or_other().to_string())
            .or_default()
            .push(service.to_string());
    }
    Json(cats)
}

/// GET /llm/full
/// Every loaded document keyed by document name
pub async fn llm_full(State(state): State<AppState>) -> Response {
    let store = state.store();
    Json(FullDocs {
        meta: store.meta(),
        documents: store.documents(),
    })
    .into_response()
}

/// GET /llm/compact
/// `"METHOD path"` per endpoint, grouped by service
pub async fn llm_compact(State(state): State<AppState>) -> Json<BTreeMap<String, Vec<String>>> {
    let compact = state
        .store()
        .services()
        .map(|(service, doc)| {
            (
                service.to_string(),
                doc.endpoints.iter().map(|ep| ep.signature()).collect(),
            )
        })
        .collect();
    Json(compact)
}
