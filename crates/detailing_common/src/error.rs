use std::fmt;
use thiserror::Error;

/// The base error type for all detailing backend errors.
///
/// Each crate defines its own error enum and implements
/// `From<SpecificError> for DetailingError`, so handlers can use `?` and still
/// produce a consistent HTTP response.
#[derive(Error, Debug)]
pub enum DetailingError {
    /// Error occurred during an HTTP request
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred during authentication or authorization
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error occurred during validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error occurred during external service call
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// An upstream API answered with an error status.
    ///
    /// `errors` holds the upstream's structured error objects verbatim; they are
    /// passed through to the caller unchanged.
    #[error("{service_name} returned status {status_code}: {message}")]
    UpstreamError {
        service_name: String,
        status_code: u16,
        errors: Vec<serde_json::Value>,
        message: String,
    },

    /// Error occurred due to a conflict (e.g., resource already claimed)
    #[error("Conflict: {0}")]
    ConflictError(String),

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Error occurred due to a timeout
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for DetailingError {
    fn status_code(&self) -> u16 {
        match self {
            DetailingError::HttpError(_) => 502,
            DetailingError::ParseError(_) => 400,
            DetailingError::ConfigError(_) => 500,
            DetailingError::AuthError(_) => 401,
            DetailingError::ValidationError(_) => 400,
            DetailingError::ExternalServiceError { .. } => 502,
            DetailingError::UpstreamError { status_code, .. } => *status_code,
            DetailingError::ConflictError(_) => 409,
            DetailingError::NotFoundError(_) => 404,
            DetailingError::TimeoutError(_) => 504,
            DetailingError::InternalError(_) => 500,
        }
    }
}

/// A trait for adding context to errors.
pub trait Context<T, E> {
    /// Adds context to an error.
    fn context<C>(self, context: C) -> Result<T, DetailingError>
    where
        C: fmt::Display + Send + Sync + 'static;

    /// Adds context to an error with a lazy context provider.
    fn with_context<C, F>(self, f: F) -> Result<T, DetailingError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E: std::error::Error + Send + Sync + 'static> Context<T, E> for Result<T, E> {
    fn context<C>(self, context: C) -> Result<T, DetailingError>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|error| DetailingError::InternalError(format!("{}: {}", context, error)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, DetailingError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|error| DetailingError::InternalError(format!("{}: {}", f(), error)))
    }
}

// Common error conversions
impl From<reqwest::Error> for DetailingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DetailingError::TimeoutError(err.to_string())
        } else {
            DetailingError::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DetailingError {
    fn from(err: serde_json::Error) -> Self {
        DetailingError::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for DetailingError {
    fn from(err: std::io::Error) -> Self {
        DetailingError::InternalError(err.to_string())
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> DetailingError {
    DetailingError::ConfigError(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> DetailingError {
    DetailingError::ValidationError(message.to_string())
}

pub fn auth_error<T: fmt::Display>(message: T) -> DetailingError {
    DetailingError::AuthError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> DetailingError {
    DetailingError::NotFoundError(message.to_string())
}

pub fn conflict<T: fmt::Display>(message: T) -> DetailingError {
    DetailingError::ConflictError(message.to_string())
}

pub fn external_service_error<T: fmt::Display>(service_name: &str, message: T) -> DetailingError {
    DetailingError::ExternalServiceError {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}

pub fn internal_error<T: fmt::Display>(message: T) -> DetailingError {
    DetailingError::InternalError(message.to_string())
}
