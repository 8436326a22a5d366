//! Test utilities for d3bugr-client
//!
//! Provides helpers for running integration tests against a gateway and
//! for standing up mock backends behind it.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

use crate::{GatewayClient, Result};

/// A test server that automatically shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: GatewayClient,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Serve a router on an ephemeral local port
    ///
    /// # Example
    ///
    /// ```ignore
    /// use d3bugr_client::testing::TestServer;
    /// use d3bugr_api::{create_router, AppState};
    ///
    /// let server = TestServer::start(create_router(state)).await?;
    /// let services = server.client.list_services().await?;
    /// ```
    pub async fn start<S>(router: axum::Router<S>) -> Result<Self>
    where
        S: Clone + Send + Sync + 'static,
        axum::Router<S>: Into<axum::Router>,
    {
        let (addr, shutdown_tx, handle) = serve(router.into()).await?;
        let client = GatewayClient::with_config(
            &format!("http://{}", addr),
            Duration::from_secs(5),
            Duration::from_secs(2),
        )?;

        Ok(Self {
            addr,
            client,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Same as [`TestServer::start`], with a client that presents `api_key`
    pub async fn start_with_api_key<S>(router: axum::Router<S>, api_key: &str) -> Result<Self>
    where
        S: Clone + Send + Sync + 'static,
        axum::Router<S>: Into<axum::Router>,
    {
        let (addr, shutdown_tx, handle) = serve(router.into()).await?;
        let client = GatewayClient::with_api_key(&format!("http://{}", addr), api_key)?;

        Ok(Self {
            addr,
            client,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Get the base URL of the test server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

type Spawned = (
    SocketAddr,
    tokio::sync::oneshot::Sender<()>,
    tokio::task::JoinHandle<()>,
);

async fn serve(router: axum::Router) -> Result<Spawned> {
    // Bind to any available port
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .ok();
    });

    // Give server a moment to start
    tokio::time::sleep(Duration::from_millis(10)).await;

    Ok((addr, shutdown_tx, handle))
}

/// A stand-in backend service listening on an ephemeral port
pub struct MockBackend {
    pub addr: SocketAddr,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl MockBackend {
    /// Serve `router` as a backend
    pub async fn start(router: axum::Router) -> Result<Self> {
        let (addr, shutdown_tx, handle) = serve(router).await?;
        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Backend that accepts connections, reads the request and closes the
    /// connection without answering
    pub async fn hang_up() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
            }
        });

        Ok(Self {
            addr,
            shutdown_tx: None,
            handle: Some(handle),
        })
    }

    /// Base URL to register the backend under
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// An address nothing listens on
///
/// Binds an ephemeral port and releases it immediately, so connections to it
/// are refused.
pub async fn closed_address() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}", addr))
}
