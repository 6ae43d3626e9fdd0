// --- File: crates/detailing_booking/src/lib.rs ---
pub mod availability;
#[cfg(test)]
mod availability_proptest;
#[cfg(test)]
mod availability_test;
pub mod catalog;
#[cfg(feature = "openapi")]
pub mod doc;
pub mod error;
pub mod handlers;
pub mod no_show;
pub mod records;
pub mod routes;
pub mod seller_note;

pub use error::BookingError;
pub use handlers::BookingState;
pub use routes::{routes, routes_with_state};
