// --- File: crates/detailing_booking/src/routes.rs ---

use crate::availability::AvailabilitySettings;
use crate::error::BookingError;
use crate::handlers::{
    cancel_booking_handler, catalog_handler, charge_no_show_handler, create_booking_handler,
    list_bookings_handler, month_availability_handler, no_show_check_handler,
    search_availability_handler, update_booking_handler, BookingState,
};
use crate::no_show::NoShowSettings;
use crate::records::InMemoryPaymentRecordStore;
use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use detailing_admin::SessionGuard;
use detailing_config::AppConfig;
use detailing_square::SquareApi;
use std::sync::Arc;

/// Creates the booking router with a process-local payment record store.
pub fn routes(
    square: Arc<dyn SquareApi>,
    guard: Arc<SessionGuard>,
    config: &AppConfig,
) -> Result<Router, BookingError> {
    let state = BookingState::new(
        square,
        Arc::new(InMemoryPaymentRecordStore::new()),
        guard,
        AvailabilitySettings::from_config(&config.business)?,
        NoShowSettings::from_config(&config.no_show),
    );
    Ok(routes_with_state(Arc::new(state)))
}

pub fn routes_with_state(state: Arc<BookingState>) -> Router {
    Router::new()
        .route("/bookings/availability/search", get(search_availability_handler))
        .route("/availability", get(month_availability_handler))
        .route(
            "/square/bookings",
            get(list_bookings_handler).post(create_booking_handler),
        )
        .route("/square/bookings/{id}", patch(update_booking_handler))
        .route("/bookings/{id}", delete(cancel_booking_handler))
        .route("/bookings/{id}/charge-no-show", post(charge_no_show_handler))
        .route("/cron/no-show-check", get(no_show_check_handler))
        .route("/catalog", get(catalog_handler))
        .with_state(state)
}
