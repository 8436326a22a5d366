//! d3bugrd - d3bugr gateway daemon
//!
//! Loads the descriptor documents, builds the service registry and serves
//! the documentation, status and `/call` routes on one port.
//!
//! Usage:
//!   d3bugrd [--config d3bugr.toml] [--host 0.0.0.0] [--port 8080]
//!           [--docs-dir docs] [--api-key KEY]
//!
//! The API key can also come from `D3BUGR_API_KEY`. Without one the
//! gateway runs open.

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use d3bugr_api::{create_router, AppState};
use d3bugr_core::DescriptorStore;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{CliOverrides, FileConfig};

const DEFAULT_LOG_FILTER: &str = "d3bugrd=info,d3bugr_api=info,d3bugr_gateway=info";

#[derive(Parser)]
#[command(name = "d3bugrd")]
#[command(author, version, about = "d3bugr gateway daemon")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "D3BUGR_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory of descriptor JSON documents
    #[arg(short, long)]
    docs_dir: Option<PathBuf>,

    /// Shared secret required in X-API-Key (or ?api_key=)
    #[arg(long, env = "D3BUGR_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn init_logging(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    tracing::info!("Starting d3bugrd (d3bugr gateway)");

    let file = match &cli.config {
        Some(path) => {
            tracing::info!("Loading config from: {}", path.display());
            FileConfig::load_from(path)?
        }
        None => FileConfig::default(),
    };
    let settings = file.merge_with_args(&CliOverrides {
        host: cli.host,
        port: cli.port,
        docs_dir: cli.docs_dir,
        api_key: cli.api_key,
    });

    let store = DescriptorStore::load_dir(&settings.docs_dir).with_context(|| {
        format!(
            "Failed to load descriptors from {}",
            settings.docs_dir.display()
        )
    })?;

    let client = d3bugr_gateway::http_client().context("Failed to build HTTP client")?;
    let auth_enabled = settings.gateway.api_key.is_some();
    let state = AppState::new(store, client, settings.gateway.clone())
        .context("Invalid service registry")?;

    for (name, url) in state.registry().iter() {
        tracing::info!(service = %name, url = %url, "Registered service");
    }
    tracing::info!(
        services = state.registry().len(),
        documents = state.store().len(),
        auth = if auth_enabled { "api_key" } else { "open" },
        get_timeout = ?settings.gateway.timeouts.get,
        post_timeout = ?settings.gateway.timeouts.post,
        "Gateway ready"
    );

    let app = create_router(state);

    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("d3bugrd stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
