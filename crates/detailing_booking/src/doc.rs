// --- File: crates/detailing_booking/src/doc.rs ---
#![cfg(feature = "openapi")]

use crate::availability::AvailabilityDay;
use crate::catalog::{
    CatalogShape, CatalogSource, CategorySummary, ServiceSummary, SimplifiedService,
    VariationSummary,
};
use crate::handlers::{
    AvailabilityResponse, BookingListResponse, BookingResponse, ChargeNoShowResponse,
    CreateBookingRequest, UpdateBookingRequest,
};
use crate::no_show::{ChargeReceipt, NoShowResult, NoShowRunReport, NoShowStatus};
use detailing_square::models::{AppointmentSegment, Booking, BookingStatus};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::search_availability_handler,
        crate::handlers::month_availability_handler,
        crate::handlers::list_bookings_handler,
        crate::handlers::create_booking_handler,
        crate::handlers::update_booking_handler,
        crate::handlers::cancel_booking_handler,
        crate::handlers::charge_no_show_handler,
        crate::handlers::no_show_check_handler,
        crate::handlers::catalog_handler,
    ),
    components(schemas(
        AvailabilityDay,
        AvailabilityResponse,
        Booking,
        BookingStatus,
        AppointmentSegment,
        BookingListResponse,
        BookingResponse,
        CreateBookingRequest,
        UpdateBookingRequest,
        ChargeReceipt,
        ChargeNoShowResponse,
        NoShowStatus,
        NoShowResult,
        NoShowRunReport,
        CatalogShape,
        CatalogSource,
        CategorySummary,
        ServiceSummary,
        VariationSummary,
        SimplifiedService,
    )),
    tags((name = "Bookings", description = "Availability, bookings, no-show fees and the service catalog"))
)]
pub struct BookingApiDoc;
