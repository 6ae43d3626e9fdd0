// --- File: crates/detailing_common/src/lib.rs ---

pub mod error;     // Error handling
pub mod http;      // HTTP utilities
pub mod logging;   // Logging utilities
pub mod routes;    // Route definitions

// Re-export the routes function to be used by the main backend service
pub use routes::routes;

// Re-export error types and utilities for easier access
pub use error::{
    DetailingError,
    HttpStatusCode,
    Context,
    config_error,
    validation_error,
    auth_error,
    not_found,
    conflict,
    external_service_error,
    internal_error,
};

// Re-export HTTP utilities for easier access
pub use http::{
    IntoHttpResponse,
    client::{
        HTTP_CLIENT,
        DEFAULT_TIMEOUT_SECS,
        create_client,
        client_with_timeout,
    },
};

// Re-export logging utilities for easier access
pub use logging::{
    init,
    init_with_level,
    init_with_file,
};

// This crate provides what every other crate in the workspace shares:
// the error type and its HTTP mapping, the HTTP client, logging, common routes.
