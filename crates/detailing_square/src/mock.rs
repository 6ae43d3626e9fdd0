// --- File: crates/detailing_square/src/mock.rs ---

//! `MockSquare`, a mockall double of [`SquareApi`] for tests in this and
//! dependent crates (enable the `mocks` feature).

use crate::api::SquareApi;
use crate::error::SquareError;
use crate::models::{
    Booking, BookingListQuery, Card, CatalogObject, CreateCardRequest, CreatePaymentRequest,
    Customer, CustomerSearch, Payment, PaymentListQuery, TeamMember,
};
use async_trait::async_trait;
use mockall::mock;

mock! {
    pub Square {}

    #[async_trait]
    impl SquareApi for Square {
        async fn list_bookings(&self, query: BookingListQuery) -> Result<Vec<Booking>, SquareError>;
        async fn retrieve_booking(&self, booking_id: &str) -> Result<Booking, SquareError>;
        async fn create_booking(&self, booking: Booking, idempotency_key: String) -> Result<Booking, SquareError>;
        async fn update_booking(&self, booking_id: &str, booking: Booking) -> Result<Booking, SquareError>;
        async fn cancel_booking(&self, booking_id: &str, booking_version: Option<i64>) -> Result<Booking, SquareError>;
        async fn create_payment(&self, request: CreatePaymentRequest) -> Result<Payment, SquareError>;
        async fn list_payments(&self, query: PaymentListQuery) -> Result<Vec<Payment>, SquareError>;
        async fn create_card(&self, request: CreateCardRequest) -> Result<Card, SquareError>;
        async fn search_customers(&self, search: CustomerSearch) -> Result<Vec<Customer>, SquareError>;
        async fn create_customer(&self, customer: Customer, idempotency_key: String) -> Result<Customer, SquareError>;
        async fn list_catalog(&self) -> Result<Vec<CatalogObject>, SquareError>;
        async fn retrieve_catalog_object(&self, object_id: &str) -> Result<CatalogObject, SquareError>;
        async fn list_team_members(&self) -> Result<Vec<TeamMember>, SquareError>;
        async fn location_id(&self) -> Result<String, SquareError>;
    }
}
