// --- File: crates/detailing_square/src/error.rs ---
use crate::models::SquareApiError;
use detailing_common::{external_service_error, DetailingError, HttpStatusCode};
use thiserror::Error;

pub const SERVICE_NAME: &str = "Square";

/// Square-specific error types.
#[derive(Error, Debug)]
pub enum SquareError {
    /// Error occurred during a Square API request
    #[error("Square API request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Square answered with a non-2xx status
    #[error("Square API returned an error: {message} (Status: {status_code})")]
    Api {
        status_code: u16,
        errors: Vec<SquareApiError>,
        message: String,
    },

    /// Error parsing a Square API response
    #[error("Failed to parse Square API response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// A 2xx response without the object it should carry
    #[error("Square response is missing `{0}`")]
    MissingField(&'static str),

    /// Missing or incomplete Square configuration
    #[error("Square configuration missing or incomplete: {0}")]
    ConfigError(String),
}

impl SquareError {
    /// Builds an `Api` error from a status and Square's `errors` array.
    pub fn api(status_code: u16, errors: Vec<SquareApiError>) -> Self {
        let message = errors
            .iter()
            .map(|e| match &e.detail {
                Some(detail) => format!("{}: {}", e.code, detail),
                None => e.code.clone(),
            })
            .collect::<Vec<_>>()
            .join("; ");
        SquareError::Api {
            status_code,
            errors,
            message,
        }
    }

    /// True when Square reported the given error code, e.g. `NOT_FOUND`.
    pub fn has_code(&self, code: &str) -> bool {
        match self {
            SquareError::Api { errors, .. } => errors.iter().any(|e| e.code == code),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SquareError::Api { status_code: 404, .. }) || self.has_code("NOT_FOUND")
    }
}

/// Convert SquareError to DetailingError
impl From<SquareError> for DetailingError {
    fn from(err: SquareError) -> Self {
        match err {
            SquareError::RequestError(e) => DetailingError::from(e),
            SquareError::Api {
                status_code,
                errors,
                message,
            } => DetailingError::UpstreamError {
                service_name: SERVICE_NAME.to_string(),
                status_code,
                errors: errors
                    .into_iter()
                    .filter_map(|e| serde_json::to_value(e).ok())
                    .collect(),
                message,
            },
            SquareError::ParseError(e) => external_service_error(SERVICE_NAME, format!("unreadable response: {}", e)),
            SquareError::MissingField(field) => {
                external_service_error(SERVICE_NAME, format!("response is missing `{}`", field))
            }
            SquareError::ConfigError(msg) => DetailingError::ConfigError(format!("Square: {}", msg)),
        }
    }
}

impl HttpStatusCode for SquareError {
    fn status_code(&self) -> u16 {
        match self {
            SquareError::RequestError(e) if e.is_timeout() => 504,
            SquareError::RequestError(_) => 502,
            SquareError::Api { status_code, .. } => *status_code,
            SquareError::ParseError(_) => 502,
            SquareError::MissingField(_) => 502,
            SquareError::ConfigError(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking_state_error() -> SquareError {
        SquareError::api(
            400,
            vec![SquareApiError {
                category: "INVALID_REQUEST_ERROR".to_string(),
                code: "INVALID_BOOKING_STATE".to_string(),
                detail: Some("Booking is already cancelled".to_string()),
                field: None,
            }],
        )
    }

    #[test]
    fn test_api_error_message_joins_codes() {
        let err = booking_state_error();
        assert!(err.has_code("INVALID_BOOKING_STATE"));
        assert!(!err.is_not_found());
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("INVALID_BOOKING_STATE: Booking is already cancelled"));
    }

    #[test]
    fn test_api_error_becomes_upstream_error_with_verbatim_errors() {
        let err: DetailingError = booking_state_error().into();
        match err {
            DetailingError::UpstreamError {
                status_code, errors, ..
            } => {
                assert_eq!(status_code, 400);
                assert_eq!(errors[0]["code"], "INVALID_BOOKING_STATE");
                assert_eq!(errors[0]["category"], "INVALID_REQUEST_ERROR");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_field_is_bad_gateway() {
        let err: DetailingError = SquareError::MissingField("booking").into();
        assert_eq!(err.status_code(), 502);
    }
}
