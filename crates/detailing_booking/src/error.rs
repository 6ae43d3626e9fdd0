// --- File: crates/detailing_booking/src/error.rs ---
use detailing_common::{DetailingError, HttpStatusCode};
use detailing_square::SquareError;
use serde_json::json;
use thiserror::Error;

pub const INVALID_BOOKING_STATE: &str = "INVALID_BOOKING_STATE";

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Booking {0} not found")]
    NotFound(String),

    /// The booking's status does not allow the requested operation.
    #[error("{0}")]
    InvalidState(String),

    #[error("No payment details stored for booking {0}")]
    MissingPaymentDetails(String),

    #[error("No-show fee already charged for booking {booking_id} (payment {payment_id})")]
    AlreadyCharged {
        booking_id: String,
        payment_id: String,
    },

    #[error("Booking {0} is being charged by another run")]
    ClaimedElsewhere(String),

    #[error("A no-show check is already running")]
    RunInProgress,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Square(#[from] SquareError),
}

impl From<BookingError> for DetailingError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::InvalidRequest(msg) => DetailingError::ValidationError(msg),
            BookingError::NotFound(_) => DetailingError::NotFoundError(err.to_string()),
            // Same shape Square uses when it rejects a transition itself.
            BookingError::InvalidState(detail) => DetailingError::UpstreamError {
                service_name: detailing_square::error::SERVICE_NAME.to_string(),
                status_code: 400,
                errors: vec![json!({
                    "category": "INVALID_REQUEST_ERROR",
                    "code": INVALID_BOOKING_STATE,
                    "detail": detail,
                })],
                message: format!("{}: {}", INVALID_BOOKING_STATE, detail),
            },
            BookingError::MissingPaymentDetails(_) => DetailingError::ValidationError(err.to_string()),
            BookingError::AlreadyCharged { .. }
            | BookingError::ClaimedElsewhere(_)
            | BookingError::RunInProgress => DetailingError::ConflictError(err.to_string()),
            BookingError::Config(msg) => DetailingError::ConfigError(msg),
            BookingError::Square(e) if e.is_not_found() => DetailingError::NotFoundError(e.to_string()),
            BookingError::Square(e) => e.into(),
        }
    }
}

impl HttpStatusCode for BookingError {
    fn status_code(&self) -> u16 {
        match self {
            BookingError::InvalidRequest(_)
            | BookingError::InvalidState(_)
            | BookingError::MissingPaymentDetails(_) => 400,
            BookingError::NotFound(_) => 404,
            BookingError::AlreadyCharged { .. }
            | BookingError::ClaimedElsewhere(_)
            | BookingError::RunInProgress => 409,
            BookingError::Config(_) => 500,
            BookingError::Square(e) if e.is_not_found() => 404,
            BookingError::Square(e) => e.status_code(),
        }
    }
}
