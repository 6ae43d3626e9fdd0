use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::error::{DetailingError, HttpStatusCode};

// Include the client module
pub mod client;

/// Extension trait for DetailingError to convert it to an Axum HTTP response.
pub trait IntoHttpResponse {
    /// Converts the error into an Axum HTTP response.
    fn into_http_response(self) -> Response;
}

impl IntoHttpResponse for DetailingError {
    fn into_http_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = match self {
            // Structured upstream errors are surfaced verbatim.
            DetailingError::UpstreamError { errors, .. } if !errors.is_empty() => {
                json!({ "errors": errors })
            }
            DetailingError::UpstreamError {
                service_name,
                message,
                ..
            } => json!({
                "error": format!("{} request failed", service_name),
                "details": message,
            }),
            DetailingError::ExternalServiceError {
                service_name,
                message,
            } => json!({
                "error": format!("{} request failed", service_name),
                "details": message,
            }),
            err @ (DetailingError::InternalError(_) | DetailingError::ConfigError(_)) => {
                error!("Internal error: {}", err);
                json!({ "error": "Internal server error" })
            }
            other => json!({ "error": other.to_string() }),
        };

        (status_code, Json(body)).into_response()
    }
}

/// Implement IntoResponse for DetailingError to make it easier to use in Axum handlers.
impl IntoResponse for DetailingError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}
