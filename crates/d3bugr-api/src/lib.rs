//! d3bugr-api - HTTP layer of the d3bugr gateway
//!
//! Serves the documentation/discovery routes, the backend health summary
//! and the `/call` forwarding surface on top of an immutable [`AppState`].
//!
//! # Usage
//!
//! ```ignore
//! use d3bugr_api::{create_router, AppState, GatewayOptions};
//! use d3bugr_core::DescriptorStore;
//!
//! let store = DescriptorStore::load_dir("docs")?;
//! let state = AppState::new(store, d3bugr_gateway::http_client()?, GatewayOptions::default())?;
//! let router = create_router(state);
//! ```

pub mod auth;
pub mod error;
pub mod handlers;
pub mod state;

pub use auth::{AccessGate, API_KEY_HEADER, API_KEY_PARAM};
pub use error::ApiError;
pub use state::{AppState, GatewayOptions};

use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Body of the liveness route
pub const LIVENESS_BODY: &str = "ok";

/// Create the gateway router with the given application state
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Documentation routes
        .route("/", get(handlers::docs::index))
        .route("/meta", get(handlers::docs::meta))
        .route("/context", get(handlers::docs::context))
        .route("/workflow", get(handlers::docs::workflow))
        .route("/services", get(handlers::docs::list_services))
        .route("/services/{name}", get(handlers::docs::get_service))
        .route("/endpoints", get(handlers::docs::endpoints))
        .route("/mcp", get(handlers::docs::mcp))
        .route("/examples", get(handlers::docs::examples))
        .route("/categories", get(handlers::docs::categories))
        .route("/llm/full", get(handlers::docs::llm_full))
        .route("/llm/compact", get(handlers::docs::llm_compact))
        // Backend health
        .route("/status", get(handlers::status::status))
        // Forwarding routes; the wildcard never matches an empty sub-path
        .route(
            "/call/{service}",
            get(handlers::call::call_get).post(handlers::call::call_post),
        )
        .route(
            "/call/{service}/",
            get(handlers::call::call_get).post(handlers::call::call_post),
        )
        .route(
            "/call/{service}/{*path}",
            get(handlers::call::call_get).post(handlers::call::call_post),
        )
        // Everything above requires the API key when one is configured
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ))
        // Liveness check, always open
        .route("/health", get(|| async { LIVENESS_BODY }))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
