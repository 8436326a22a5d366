//! d3bugr Client Library
//!
//! Provides a typed HTTP client for the d3bugr gateway.
//!
//! # Example
//!
//! ```rust,no_run
//! use d3bugr_client::GatewayClient;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = GatewayClient::with_api_key("http://localhost:8080", "secret")?;
//!
//!     // Discover what sits behind the gateway
//!     let services = client.list_services().await?;
//!
//!     // Check which backends are up
//!     let status = client.status().await?;
//!     println!("{} of {} online", status.summary.online, status.summary.total);
//!
//!     // Invoke a backend through the gateway
//!     let scan = client
//!         .call_post("nuclei", "scan", &json!({"target": "example.com"}))
//!         .await?;
//!     println!("{}: {:?}", scan.status, scan.body);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! The `testing` module provides utilities for integration testing:
//!
//! ```rust,ignore
//! use d3bugr_client::testing::TestServer;
//! use d3bugr_api::{create_router, AppState};
//!
//! let server = TestServer::start(create_router(state)).await?;
//! let services = server.client.list_services().await?;
//! ```

mod client;
mod error;
pub mod testing;
mod types;

pub use client::GatewayClient;
pub use error::{ClientError, Result};
pub use types::*;
