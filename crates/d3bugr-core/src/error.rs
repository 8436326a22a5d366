//! Error types for descriptor loading and request forwarding

use std::path::PathBuf;

use thiserror::Error;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors raised while loading descriptor documents or building the registry.
///
/// All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// Descriptor directory or file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Descriptor file is not valid JSON for its document type
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Two descriptors declare the same service name
    #[error("Duplicate service name: {0}")]
    DuplicateService(String),

    /// A descriptor declares an address that is not an absolute http(s) base URL
    #[error("Invalid address for service {service}: {url} ({reason})")]
    InvalidAddress {
        service: String,
        url: String,
        reason: String,
    },
}

/// Errors produced while handling a gateway call.
///
/// Every variant maps to one HTTP status via [`GatewayError::status_code`].
/// Upstream responses that were actually received are never turned into
/// one of these, whatever their status.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Requested service is not in the registry
    #[error("Service not found: {service}")]
    ServiceNotFound {
        service: String,
        path: String,
        /// Every registered service name, sorted
        available: Vec<String>,
    },

    /// A secret is configured and the caller supplied none
    #[error("API key required")]
    AuthMissing,

    /// A secret is configured and the caller supplied a different one
    #[error("Invalid API key")]
    AuthInvalid,

    /// Outbound call exceeded its timeout budget
    #[error("Upstream {service} timed out on /{path}")]
    UpstreamTimeout { service: String, path: String },

    /// Outbound connection could not be established
    #[error("Upstream {service} unavailable on /{path}: {message}")]
    UpstreamUnavailable {
        service: String,
        path: String,
        message: String,
    },

    /// Any other transport-level failure
    #[error("Upstream {service} failed on /{path}: {message}")]
    UpstreamError {
        service: String,
        path: String,
        message: String,
    },

    /// Inbound POST body is not JSON
    #[error("Invalid JSON body for {service}/{path}: {message}")]
    InvalidBody {
        service: String,
        path: String,
        message: String,
    },
}

impl GatewayError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::ServiceNotFound { .. } => 404,
            GatewayError::AuthMissing => 401,
            GatewayError::AuthInvalid => 403,
            GatewayError::UpstreamTimeout { .. } => 504,
            GatewayError::UpstreamUnavailable { .. } => 503,
            GatewayError::UpstreamError { .. } => 500,
            GatewayError::InvalidBody { .. } => 400,
        }
    }

    /// Machine-readable reason, used as the `error` field of response bodies
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::ServiceNotFound { .. } => "service_not_found",
            GatewayError::AuthMissing => "auth_missing",
            GatewayError::AuthInvalid => "auth_invalid",
            GatewayError::UpstreamTimeout { .. } => "upstream_timeout",
            GatewayError::UpstreamUnavailable { .. } => "upstream_unavailable",
            GatewayError::UpstreamError { .. } => "upstream_error",
            GatewayError::InvalidBody { .. } => "invalid_body",
        }
    }

    /// Target service, when the error concerns one
    pub fn service(&self) -> Option<&str> {
        match self {
            GatewayError::ServiceNotFound { service, .. }
            | GatewayError::UpstreamTimeout { service, .. }
            | GatewayError::UpstreamUnavailable { service, .. }
            | GatewayError::UpstreamError { service, .. }
            | GatewayError::InvalidBody { service, .. } => Some(service),
            GatewayError::AuthMissing | GatewayError::AuthInvalid => None,
        }
    }

    /// Forwarding sub-path, when the error concerns one
    pub fn path(&self) -> Option<&str> {
        match self {
            GatewayError::ServiceNotFound { path, .. }
            | GatewayError::UpstreamTimeout { path, .. }
            | GatewayError::UpstreamUnavailable { path, .. }
            | GatewayError::UpstreamError { path, .. }
            | GatewayError::InvalidBody { path, .. } => Some(path),
            GatewayError::AuthMissing | GatewayError::AuthInvalid => None,
        }
    }
}
