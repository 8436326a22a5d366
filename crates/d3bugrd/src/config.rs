//! Configuration file handling for d3bugrd
//!
//! Precedence is CLI flag, then config file, then built-in default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use d3bugr_api::GatewayOptions;
use d3bugr_gateway::{UpstreamTimeouts, DEFAULT_HEALTH_PATH};
use serde::Deserialize;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DOCS_DIR: &str = "docs";

/// Contents of the TOML config file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server: ServerSection,
    pub docs: DocsSection,
    pub auth: AuthSection,
    pub timeouts: TimeoutsSection,
    pub health: HealthSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocsSection {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthSection {
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutsSection {
    pub get_secs: Option<u64>,
    pub post_secs: Option<u64>,
    pub health_secs: Option<u64>,
}

impl TimeoutsSection {
    /// A zero budget would fail every call before it is sent
    fn validate(&self) -> Result<()> {
        let budgets = [
            ("get_secs", self.get_secs),
            ("post_secs", self.post_secs),
            ("health_secs", self.health_secs),
        ];
        for (key, value) in budgets {
            if value == Some(0) {
                bail!("timeouts.{} must be at least 1 second", key);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HealthSection {
    pub path: Option<String>,
}

impl FileConfig {
    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.timeouts.validate()?;
        Ok(config)
    }

    /// Overlay CLI values on the file values and fill in defaults
    pub fn merge_with_args(self, args: &CliOverrides) -> Settings {
        let defaults = UpstreamTimeouts::default();
        let secs = |value: Option<u64>, fallback: Duration| {
            value.map(Duration::from_secs).unwrap_or(fallback)
        };

        Settings {
            host: args
                .host
                .clone()
                .or(self.server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: args.port.or(self.server.port).unwrap_or(DEFAULT_PORT),
            docs_dir: args
                .docs_dir
                .clone()
                .or(self.docs.dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCS_DIR)),
            gateway: GatewayOptions {
                timeouts: UpstreamTimeouts {
                    get: secs(self.timeouts.get_secs, defaults.get),
                    post: secs(self.timeouts.post_secs, defaults.post),
                    health: secs(self.timeouts.health_secs, defaults.health),
                },
                health_path: self
                    .health
                    .path
                    .unwrap_or_else(|| DEFAULT_HEALTH_PATH.to_string()),
                api_key: args
                    .api_key
                    .clone()
                    .or(self.auth.api_key)
                    .filter(|key| !key.is_empty()),
            },
        }
    }
}

/// Values taken from the command line, `None` when not given
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub docs_dir: Option<PathBuf>,
    pub api_key: Option<String>,
}

/// Fully resolved daemon configuration
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub docs_dir: PathBuf,
    pub gateway: GatewayOptions,
}

impl Settings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
