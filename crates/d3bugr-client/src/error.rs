//! Error types for gateway client operations

use thiserror::Error;

/// Result type alias for gateway client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur during gateway client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Gateway returned an error response
    #[error("Server error {status} ({error}): {message}")]
    ServerError {
        status: u16,
        error: String,
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl ClientError {
    /// Status code of a server error, if this is one
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
