//! Forwarding handlers (`/call/{service}/{*path}`)
//!
//! GET forwards the inbound query string, POST forwards the inbound JSON
//! body. Upstream responses are relayed with their own status code.

use axum::body::Bytes;
use axum::extract::{RawQuery, State};
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use d3bugr_core::GatewayError;
use d3bugr_gateway::{ForwardRequest, UpstreamBody, UpstreamResponse};
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /call/{service}/{*path}
pub async fn call_get(
    State(state): State<AppState>,
    uri: Uri,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let (service, path) = call_target(&uri);
    forward_get(&state, service, path, query.as_deref()).await
}

/// POST /call/{service}/{*path}
pub async fn call_post(
    State(state): State<AppState>,
    uri: Uri,
    body: Bytes,
) -> Result<Response, ApiError> {
    let (service, path) = call_target(&uri);
    forward_post(&state, service, path, &body).await
}

/// Split the request path into service name and sub-path.
///
/// Works on the path as received, so percent-encoded characters in the
/// sub-path (`%2F`, `%3F`, `%23`) reach the backend still encoded.
/// `/call/{service}` and `/call/{service}/` both yield an empty sub-path.
fn call_target(uri: &Uri) -> (String, String) {
    let rest = uri.path().strip_prefix("/call/").unwrap_or_default();
    match rest.split_once('/') {
        Some((service, path)) => (service.to_string(), path.to_string()),
        None => (rest.to_string(), String::new()),
    }
}

async fn forward_get(
    state: &AppState,
    service: String,
    path: String,
    query: Option<&str>,
) -> Result<Response, ApiError> {
    let query = state.gate().strip_credential(query_pairs(query));
    let response = state
        .forwarder()
        .forward(ForwardRequest::get(service, path, query))
        .await?;
    Ok(relay(response))
}

async fn forward_post(
    state: &AppState,
    service: String,
    path: String,
    body: &[u8],
) -> Result<Response, ApiError> {
    let body = match parse_body(body) {
        Ok(body) => body,
        Err(e) => {
            return Err(GatewayError::InvalidBody {
                service,
                path,
                message: e.to_string(),
            }
            .into())
        }
    };
    let response = state
        .forwarder()
        .forward(ForwardRequest::post(service, path, body))
        .await?;
    Ok(relay(response))
}

/// Decode a query string into ordered pairs, duplicates kept
fn query_pairs(query: Option<&str>) -> Vec<(String, String)> {
    query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default()
}

/// An empty body is an empty object, never `null`
fn parse_body(body: &[u8]) -> Result<Value, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body)
}

/// Turn an upstream response into ours, keeping its status and body text
fn relay(response: UpstreamResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    match response.body {
        UpstreamBody::Json(text) => {
            (status, [(header::CONTENT_TYPE, "application/json")], text).into_response()
        }
        UpstreamBody::Text(text) => (status, text).into_response(),
    }
}
