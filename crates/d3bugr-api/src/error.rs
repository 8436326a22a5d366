//! API error types and conversions

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use d3bugr_core::GatewayError;
use serde::Serialize;

/// API error type that converts to HTTP responses
#[derive(Debug)]
pub enum ApiError {
    /// Forwarding, access and body errors from the gateway taxonomy
    Gateway(GatewayError),
    /// 404 for a documentation lookup of an unknown service
    UnknownService {
        service: String,
        available: Vec<String>,
    },
}

/// Error body shared by every route.
///
/// `service` and `path` are present whenever the error concerns a
/// forwarding target; `available` only for unknown services.
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    available: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::UnknownService { service, available } => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: "service_not_found",
                    message: format!("{} not found", service),
                    service: Some(service),
                    path: None,
                    available: Some(available),
                },
            ),
            ApiError::Gateway(err) => {
                let status = StatusCode::from_u16(err.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let body = ErrorResponse {
                    error: err.kind(),
                    service: err.service().map(str::to_string),
                    path: err.path().map(str::to_string),
                    message: err.to_string(),
                    available: match err {
                        GatewayError::ServiceNotFound { available, .. } => Some(available),
                        _ => None,
                    },
                };
                (status, body)
            }
        };

        // Log errors at appropriate levels
        if status.is_server_error() {
            tracing::error!(error = body.error, message = %body.message, "API error");
        } else if status.is_client_error() {
            tracing::debug!(error = body.error, message = %body.message, "API client error");
        }

        (status, Json(body)).into_response()
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError::Gateway(err)
    }
}
