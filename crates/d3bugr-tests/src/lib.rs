//! End-to-end tests for the d3bugr gateway
//!
//! The tests exercise the full stack in-process:
//! - descriptor documents written to a temporary docs directory
//! - registry and state built from them exactly as the daemon does
//! - the router served on an ephemeral port
//! - mock tool services behind it, built as small axum routers
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p d3bugr-tests
//! ```
//!
//! No external services are needed; every backend is local.
//!
//! # Test Structure
//!
//! - `gateway_e2e_test.rs` - documentation, forwarding, status and auth
//!   through a gateway loaded from a docs directory

// This crate only contains tests, no library code
