// --- File: crates/detailing_square/src/api.rs ---
use crate::error::SquareError;
use crate::models::{
    Booking, BookingListQuery, Card, CatalogObject, CreateCardRequest, CreatePaymentRequest,
    Customer, CustomerSearch, Payment, PaymentListQuery, TeamMember,
};
use async_trait::async_trait;

/// The Square operations the backend depends on.
///
/// Handlers and the booking logic only ever see `Arc<dyn SquareApi>`, so tests
/// can swap in a mock. [`crate::SquareClient`] is the HTTP implementation.
#[async_trait]
pub trait SquareApi: Send + Sync {
    /// All bookings matching `query`, following pagination cursors.
    async fn list_bookings(&self, query: BookingListQuery) -> Result<Vec<Booking>, SquareError>;

    async fn retrieve_booking(&self, booking_id: &str) -> Result<Booking, SquareError>;

    async fn create_booking(
        &self,
        booking: Booking,
        idempotency_key: String,
    ) -> Result<Booking, SquareError>;

    /// Sparse update. `booking.version` must carry the version last read.
    async fn update_booking(&self, booking_id: &str, booking: Booking) -> Result<Booking, SquareError>;

    async fn cancel_booking(
        &self,
        booking_id: &str,
        booking_version: Option<i64>,
    ) -> Result<Booking, SquareError>;

    async fn create_payment(&self, request: CreatePaymentRequest) -> Result<Payment, SquareError>;

    async fn list_payments(&self, query: PaymentListQuery) -> Result<Vec<Payment>, SquareError>;

    async fn create_card(&self, request: CreateCardRequest) -> Result<Card, SquareError>;

    async fn search_customers(&self, search: CustomerSearch) -> Result<Vec<Customer>, SquareError>;

    async fn create_customer(
        &self,
        customer: Customer,
        idempotency_key: String,
    ) -> Result<Customer, SquareError>;

    /// Items, categories and item variations, all pages.
    async fn list_catalog(&self) -> Result<Vec<CatalogObject>, SquareError>;

    async fn retrieve_catalog_object(&self, object_id: &str) -> Result<CatalogObject, SquareError>;

    /// Active team members only.
    async fn list_team_members(&self) -> Result<Vec<TeamMember>, SquareError>;

    /// The configured location, else the first active one. Resolved once.
    async fn location_id(&self) -> Result<String, SquareError>;
}
