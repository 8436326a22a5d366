//! Route-level tests for the gateway API using d3bugr-client
//!
//! Every test serves the real router on an ephemeral port, puts mock
//! backends behind it and talks to it through `GatewayClient`, so the
//! client stays in sync with the API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{OriginalUri, RawQuery};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use d3bugr_api::{create_router, AppState, GatewayOptions};
use d3bugr_client::testing::{closed_address, MockBackend, TestServer};
use d3bugr_client::{CallBody, ClientError};
use d3bugr_core::{DescriptorStore, MetaDocument, ServiceDescriptor};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

// =============================================================================
// Fixtures
// =============================================================================

fn descriptor(service: &str, url: &str, category: &str) -> ServiceDescriptor {
    serde_json::from_value(json!({
        "service": service,
        "url": url,
        "name": format!("{} scanner", service),
        "category": category,
        "description": format!("{} backend", service),
        "endpoints": [
            {"path": "/echo", "method": "GET", "description": "Echo query"},
            {"path": "/echo", "method": "POST", "description": "Echo body",
             "parameters": [{"name": "target", "required": true}]}
        ],
        "mcp_tools": [format!("{}_scan", service)],
        "examples": [{"request": "GET /echo?x=1"}],
        "x-notes": "kept as written"
    }))
    .unwrap()
}

fn meta() -> MetaDocument {
    serde_json::from_value(json!({
        "llm_context": {"purpose": "bug bounty toolkit"},
        "workflow": {"phases": ["recon", "scanning"]},
        "gateway_usage": {"call": "/call/{service}/{path}"},
        "version": "1.0"
    }))
    .unwrap()
}

fn build_state(services: &[(&str, &str)], options: GatewayOptions) -> AppState {
    let documents = services.iter().map(|(name, url)| {
        (
            format!("{}_doc", name),
            descriptor(name, url, if *name == "httpx" { "recon" } else { "scanning" }),
        )
    });
    let store = DescriptorStore::from_documents(Some(meta()), documents);
    AppState::new(store, d3bugr_gateway::http_client().unwrap(), options).unwrap()
}

fn gated(key: &str) -> GatewayOptions {
    GatewayOptions {
        api_key: Some(key.to_string()),
        ..GatewayOptions::default()
    }
}

/// Backend echoing its query string and JSON body, counting hits
async fn echo_backend(hits: Arc<AtomicUsize>) -> MockBackend {
    let get_hits = hits.clone();
    let post_hits = hits;
    let router = Router::new()
        .route("/", get(|| async { "root" }))
        .route("/health", get(|| async { "up" }))
        .route(
            "/echo",
            get(move |RawQuery(query): RawQuery| {
                get_hits.fetch_add(1, Ordering::SeqCst);
                async move { Json(json!({"query": query})) }
            })
            .post(move |Json(body): Json<Value>| {
                post_hits.fetch_add(1, Ordering::SeqCst);
                async move { Json(json!({"received": body})) }
            }),
        )
        .route("/deep/a/b", get(|| async { Json(json!({"deep": true})) }))
        .route(
            "/teapot",
            get(|| async { (StatusCode::IM_A_TEAPOT, "short and stout") }),
        );
    MockBackend::start(router).await.unwrap()
}

/// Backend answering every request with the path and query it received
async fn path_echo_backend() -> MockBackend {
    let router = Router::new().fallback(|OriginalUri(uri): OriginalUri| async move {
        Json(json!({"path": uri.path(), "query": uri.query()}))
    });
    MockBackend::start(router).await.unwrap()
}

// =============================================================================
// Documentation routes
// =============================================================================

#[tokio::test]
async fn services_lists_summaries() {
    let state = build_state(
        &[("httpx", "http://127.0.0.1:8001"), ("nuclei", "http://127.0.0.1:8002")],
        GatewayOptions::default(),
    );
    let server = TestServer::start(create_router(state)).await.unwrap();

    let services = server.client.list_services().await.unwrap();
    assert_eq!(
        services.keys().cloned().collect::<Vec<_>>(),
        vec!["httpx".to_string(), "nuclei".to_string()]
    );
    let httpx = &services["httpx"];
    assert_eq!(httpx.name, "httpx scanner");
    assert_eq!(httpx.category, "recon");
    assert_eq!(httpx.endpoints, vec!["/echo".to_string(), "/echo".to_string()]);
}

#[tokio::test]
async fn service_descriptor_is_returned_as_loaded() {
    let state = build_state(&[("nuclei", "http://127.0.0.1:8002")], GatewayOptions::default());
    let server = TestServer::start(create_router(state)).await.unwrap();

    let doc = server.client.get_service("nuclei").await.unwrap();
    assert_eq!(doc, descriptor("nuclei", "http://127.0.0.1:8002", "scanning"));
    assert_eq!(doc.extra["x-notes"], json!("kept as written"));
}

#[tokio::test]
async fn unknown_service_lists_available() {
    let state = build_state(
        &[("httpx", "http://127.0.0.1:8001"), ("nuclei", "http://127.0.0.1:8002")],
        GatewayOptions::default(),
    );
    let server = TestServer::start(create_router(state)).await.unwrap();

    let raw = reqwest::get(format!("{}/services/ghost", server.base_url()))
        .await
        .unwrap();
    assert_eq!(raw.status(), 404);
    let body: Value = raw.json().await.unwrap();
    assert_eq!(body["error"], "service_not_found");
    assert_eq!(body["available"], json!(["httpx", "nuclei"]));

    let err = server.client.get_service("ghost").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn documentation_routes_are_idempotent() {
    let state = build_state(&[("httpx", "http://127.0.0.1:8001")], GatewayOptions::default());
    let server = TestServer::start(create_router(state)).await.unwrap();

    for path in ["/", "/meta", "/llm/full", "/services/httpx"] {
        let first = reqwest::get(format!("{}{}", server.base_url(), path))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        let second = reqwest::get(format!("{}{}", server.base_url(), path))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        assert_eq!(first, second, "{} changed between calls", path);
    }
}

#[tokio::test]
async fn derived_documentation_views() {
    let state = build_state(
        &[("httpx", "http://127.0.0.1:8001"), ("nuclei", "http://127.0.0.1:8002")],
        GatewayOptions::default(),
    );
    let server = TestServer::start(create_router(state)).await.unwrap();
    let client = &server.client;

    let categories = client.get_json("/categories").await.unwrap();
    assert_eq!(
        categories,
        json!({"recon": ["httpx"], "scanning": ["nuclei"]})
    );

    let compact = client.get_json("/llm/compact").await.unwrap();
    assert_eq!(compact["nuclei"], json!(["GET /echo", "POST /echo"]));

    let mcp = client.get_json("/mcp").await.unwrap();
    assert_eq!(mcp["prefix"], "mcp__d3bugr__");
    assert_eq!(mcp["all"], json!(["httpx_scan", "nuclei_scan"]));

    let endpoints = client.get_json("/endpoints").await.unwrap();
    assert_eq!(endpoints.as_array().unwrap().len(), 4);

    let examples = client.get_json("/examples").await.unwrap();
    assert_eq!(examples[0]["service"], "httpx");

    let context = client.get_json("/context").await.unwrap();
    assert_eq!(context["llm_context"]["purpose"], "bug bounty toolkit");

    let workflow = client.get_json("/workflow").await.unwrap();
    assert_eq!(workflow, json!({"phases": ["recon", "scanning"]}));

    let full = client.get_json("/llm/full").await.unwrap();
    assert_eq!(full["meta"]["version"], "1.0");
    assert_eq!(full["httpx_doc"]["service"], "httpx");
}

// =============================================================================
// Access gate
// =============================================================================

#[tokio::test]
async fn health_is_open_even_with_a_key() {
    let state = build_state(&[("httpx", "http://127.0.0.1:8001")], gated("s3cret"));
    let server = TestServer::start(create_router(state)).await.unwrap();

    assert_eq!(server.client.health().await.unwrap(), "ok");
}

#[tokio::test]
async fn missing_key_is_unauthorized() {
    let state = build_state(&[("httpx", "http://127.0.0.1:8001")], gated("s3cret"));
    let server = TestServer::start(create_router(state)).await.unwrap();

    match server.client.list_services().await {
        Err(ClientError::ServerError { status, error, .. }) => {
            assert_eq!(status, 401);
            assert_eq!(error, "auth_missing");
        }
        other => panic!("expected 401, got {:?}", other),
    }
}

#[tokio::test]
async fn wrong_key_is_forbidden() {
    let state = build_state(&[("httpx", "http://127.0.0.1:8001")], gated("s3cret"));
    let server = TestServer::start_with_api_key(create_router(state), "nope")
        .await
        .unwrap();

    let err = server.client.list_services().await.unwrap_err();
    assert_eq!(err.status(), Some(403));
}

#[tokio::test]
async fn key_accepted_from_header_or_query() {
    let state = build_state(&[("httpx", "http://127.0.0.1:8001")], gated("s3cret"));
    let server = TestServer::start_with_api_key(create_router(state), "s3cret")
        .await
        .unwrap();
    assert_eq!(server.client.list_services().await.unwrap().len(), 1);

    let via_query = reqwest::get(format!("{}/services?api_key=s3cret", server.base_url()))
        .await
        .unwrap();
    assert_eq!(via_query.status(), 200);
}

#[tokio::test]
async fn rejected_calls_never_reach_the_backend() {
    let hits = Arc::new(AtomicUsize::new(0));
    let backend = echo_backend(hits.clone()).await;
    let state = build_state(&[("echo", backend.url().as_str())], gated("s3cret"));
    let server = TestServer::start(create_router(state)).await.unwrap();

    let response = server.client.call_get("echo", "echo", &[]).await.unwrap();
    assert_eq!(response.status, 401);
    let response = server
        .client
        .call_get("echo", "echo", &[("api_key", "wrong")])
        .await
        .unwrap();
    assert_eq!(response.status, 403);

    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn query_credential_is_not_forwarded() {
    let hits = Arc::new(AtomicUsize::new(0));
    let backend = echo_backend(hits.clone()).await;
    let state = build_state(&[("echo", backend.url().as_str())], gated("s3cret"));
    let server = TestServer::start(create_router(state)).await.unwrap();

    let response = server
        .client
        .call_get("echo", "echo", &[("api_key", "s3cret"), ("target", "example.com")])
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.json().unwrap()["query"], "target=example.com");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Forwarding
// =============================================================================

#[tokio::test]
async fn get_forwards_query_and_post_forwards_body() {
    let backend = echo_backend(Arc::new(AtomicUsize::new(0))).await;
    let state = build_state(&[("echo", backend.url().as_str())], GatewayOptions::default());
    let server = TestServer::start(create_router(state)).await.unwrap();

    let response = server
        .client
        .call_get("echo", "echo", &[("target", "example.com"), ("port", "443")])
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(
        response.json().unwrap()["query"],
        "target=example.com&port=443"
    );

    let body = json!({"target": "example.com", "templates": ["cves"]});
    let response = server.client.call_post("echo", "echo", &body).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.json().unwrap()["received"], body);
}

#[tokio::test]
async fn empty_post_body_is_sent_as_object() {
    let backend = echo_backend(Arc::new(AtomicUsize::new(0))).await;
    let state = build_state(&[("echo", backend.url().as_str())], GatewayOptions::default());
    let server = TestServer::start(create_router(state)).await.unwrap();

    let response = server
        .client
        .http_client()
        .post(format!("{}/call/echo/echo", server.base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["received"], json!({}));
}

#[tokio::test]
async fn invalid_post_body_is_rejected() {
    let hits = Arc::new(AtomicUsize::new(0));
    let backend = echo_backend(hits.clone()).await;
    let state = build_state(&[("echo", backend.url().as_str())], GatewayOptions::default());
    let server = TestServer::start(create_router(state)).await.unwrap();

    let response = server
        .client
        .http_client()
        .post(format!("{}/call/echo/echo", server.base_url()))
        .body("target=example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "invalid_body");
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn nested_and_root_paths_are_forwarded() {
    let backend = echo_backend(Arc::new(AtomicUsize::new(0))).await;
    let state = build_state(&[("echo", backend.url().as_str())], GatewayOptions::default());
    let server = TestServer::start(create_router(state)).await.unwrap();

    let deep = server.client.call_get("echo", "deep/a/b", &[]).await.unwrap();
    assert_eq!(deep.json(), Some(&json!({"deep": true})));

    let root = server.client.call_get("echo", "", &[]).await.unwrap();
    assert_eq!(root.status, 200);
    assert_eq!(root.text(), Some("root"));
}

#[tokio::test]
async fn encoded_sub_path_reaches_backend_encoded() {
    let backend = path_echo_backend().await;
    let state = build_state(&[("echo", backend.url().as_str())], GatewayOptions::default());
    let server = TestServer::start(create_router(state)).await.unwrap();

    let cases = [
        ("files/a%2Fb", "/files/a%2Fb"),
        ("report%3Fadmin=1", "/report%3Fadmin=1"),
        ("x%23frag/y", "/x%23frag/y"),
    ];
    for (sub_path, expected) in cases {
        let response = server.client.call_get("echo", sub_path, &[]).await.unwrap();
        assert_eq!(response.status, 200);
        let seen = response.json().unwrap();
        assert_eq!(seen["path"], expected);
        assert_eq!(seen["query"], Value::Null);
    }
}

#[tokio::test]
async fn trailing_slash_targets_service_root() {
    let backend = path_echo_backend().await;
    let state = build_state(&[("echo", backend.url().as_str())], GatewayOptions::default());
    let server = TestServer::start(create_router(state)).await.unwrap();
    let http = server.client.http_client();

    let response = http
        .get(format!("{}/call/echo/?target=example.com", server.base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let seen: Value = response.json().await.unwrap();
    assert_eq!(seen["path"], "/");
    assert_eq!(seen["query"], "target=example.com");

    let response = http
        .post(format!("{}/call/echo/", server.base_url()))
        .json(&json!({"target": "example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let seen: Value = response.json().await.unwrap();
    assert_eq!(seen["path"], "/");
}

#[tokio::test]
async fn dropped_connection_is_upstream_error() {
    let backend = MockBackend::hang_up().await.unwrap();
    let state = build_state(&[("flaky", backend.url().as_str())], GatewayOptions::default());
    let server = TestServer::start(create_router(state)).await.unwrap();

    let response = server.client.call_get("flaky", "scan", &[]).await.unwrap();
    assert_eq!(response.status, 500);
    let error = response.error().unwrap();
    assert_eq!(error.error, "upstream_error");
    assert_eq!(error.service.as_deref(), Some("flaky"));
    assert_eq!(error.path.as_deref(), Some("scan"));
    assert!(!error.message.is_empty());
}

#[tokio::test]
async fn oversized_json_numbers_are_relayed_verbatim() {
    let raw = r#"{"id":123456789012345678901234567890}"#;
    let backend = MockBackend::start(Router::new().route(
        "/big",
        get(move || async move { ([("content-type", "application/json")], raw) }),
    ))
    .await
    .unwrap();
    let state = build_state(&[("big", backend.url().as_str())], GatewayOptions::default());
    let server = TestServer::start(create_router(state)).await.unwrap();

    let response = server
        .client
        .http_client()
        .get(format!("{}/call/big/big", server.base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "application/json");
    assert_eq!(response.text().await.unwrap(), raw);
}

#[tokio::test]
async fn upstream_status_and_text_are_relayed() {
    let backend = echo_backend(Arc::new(AtomicUsize::new(0))).await;
    let state = build_state(&[("echo", backend.url().as_str())], GatewayOptions::default());
    let server = TestServer::start(create_router(state)).await.unwrap();

    let response = server.client.call_get("echo", "teapot", &[]).await.unwrap();
    assert_eq!(response.status, 418);
    assert_eq!(response.body, CallBody::Text("short and stout".into()));
}

#[tokio::test]
async fn unknown_call_target_is_not_found() {
    let state = build_state(&[("httpx", "http://127.0.0.1:8001")], GatewayOptions::default());
    let server = TestServer::start(create_router(state)).await.unwrap();

    let response = server.client.call_get("ghost", "scan", &[]).await.unwrap();
    assert_eq!(response.status, 404);
    let error = response.error().unwrap();
    assert_eq!(error.error, "service_not_found");
    assert_eq!(error.service.as_deref(), Some("ghost"));
    assert_eq!(error.available, Some(vec!["httpx".to_string()]));
}

#[tokio::test]
async fn unreachable_backend_is_unavailable() {
    let dead = closed_address().await.unwrap();
    let state = build_state(&[("dead", dead.as_str())], GatewayOptions::default());
    let server = TestServer::start(create_router(state)).await.unwrap();

    let response = server.client.call_get("dead", "scan", &[]).await.unwrap();
    assert_eq!(response.status, 503);
    let error = response.error().unwrap();
    assert_eq!(error.error, "upstream_unavailable");
    assert_eq!(error.service.as_deref(), Some("dead"));
    assert_eq!(error.path.as_deref(), Some("scan"));
}

#[tokio::test]
async fn slow_backend_times_out() {
    let slow = MockBackend::start(Router::new().route(
        "/scan",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            "late"
        }),
    ))
    .await
    .unwrap();

    let mut options = GatewayOptions::default();
    options.timeouts.get = Duration::from_millis(200);
    let state = build_state(&[("slow", slow.url().as_str())], options);
    let server = TestServer::start(create_router(state)).await.unwrap();

    let response = server.client.call_get("slow", "scan", &[]).await.unwrap();
    assert_eq!(response.status, 504);
    let error = response.error().unwrap();
    assert_eq!(error.error, "upstream_timeout");
    assert_eq!(error.service.as_deref(), Some("slow"));
}

// =============================================================================
// Status
// =============================================================================

#[tokio::test]
async fn status_reports_every_backend() {
    let up = echo_backend(Arc::new(AtomicUsize::new(0))).await;
    let failing = MockBackend::start(Router::new().route(
        "/health",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "broken") }),
    ))
    .await
    .unwrap();
    let dead = closed_address().await.unwrap();

    let state = build_state(
        &[("up", up.url().as_str()), ("failing", failing.url().as_str()), ("dead", dead.as_str())],
        GatewayOptions::default(),
    );
    let server = TestServer::start(create_router(state)).await.unwrap();

    let report = server.client.status().await.unwrap();
    assert_eq!(report.services.len(), 3);
    assert_eq!(report.services["up"].status, "online");
    assert_eq!(report.services["failing"].status, "error");
    assert_eq!(report.services["dead"].status, "offline");
    assert_eq!(report.services["dead"].url, dead);
    assert_eq!(report.summary.online, 1);
    assert_eq!(report.summary.total, 3);
}
