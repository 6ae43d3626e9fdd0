// --- File: crates/detailing_square/src/lib.rs ---

pub mod api;
pub mod client;
#[cfg(feature = "openapi")]
pub mod doc;
pub mod error;
pub mod handlers;
#[cfg(any(test, feature = "mocks"))]
pub mod mock;
pub mod models;
pub mod routes;

// Re-export for main backend and the booking crate
pub use api::SquareApi;
pub use client::SquareClient;
pub use error::SquareError;
pub use handlers::SquareState;
pub use routes::routes;
