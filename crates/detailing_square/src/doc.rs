// --- File: crates/detailing_square/src/doc.rs ---
#![cfg(feature = "openapi")]

use crate::handlers::{
    CardResponse, CreatePaymentBody, CustomerResponse, PaymentListResponse, PaymentResponse,
    SaveCardRequest, TeamMembersResponse, UpsertCustomerRequest,
};
use crate::models::{Card, Customer, Money, Payment, SquareApiError, TeamMember};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::create_card_handler,
        crate::handlers::create_payment_handler,
        crate::handlers::list_payments_handler,
        crate::handlers::upsert_customer_handler,
        crate::handlers::list_team_members_handler,
    ),
    components(schemas(
        SaveCardRequest,
        CardResponse,
        CreatePaymentBody,
        PaymentResponse,
        PaymentListResponse,
        UpsertCustomerRequest,
        CustomerResponse,
        TeamMembersResponse,
        Card,
        Customer,
        Money,
        Payment,
        TeamMember,
        SquareApiError,
    )),
    tags((name = "Square", description = "Pass-through to the Square API"))
)]
pub struct SquareApiDoc;
