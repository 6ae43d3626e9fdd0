// --- File: crates/detailing_square/src/handlers.rs ---
use crate::api::SquareApi;
use crate::models::{
    Card, CreateCardRequest, CreatePaymentRequest, Customer, CustomerSearch, Money, Payment,
    PaymentListQuery, TeamMember,
};
use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use detailing_admin::{AdminSession, HasSessionGuard, SessionGuard};
use detailing_common::{validation_error, DetailingError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub const DEFAULT_CURRENCY: &str = "USD";

// --- State for Square Handlers ---
#[derive(Clone)]
pub struct SquareState {
    pub square: Arc<dyn SquareApi>,
    pub guard: Arc<SessionGuard>,
}

impl HasSessionGuard for SquareState {
    fn session_guard(&self) -> &SessionGuard {
        &self.guard
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, DetailingError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| validation_error(format!("{} is required", field)))
}

// --- Cards ---

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SaveCardRequest {
    pub source_id: Option<String>,
    pub customer_id: Option<String>,
    pub verification_token: Option<String>,
    pub cardholder_name: Option<String>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Serialize, Debug)]
pub struct CardResponse {
    pub card: Card,
}

/// Stores a tokenized card on file for a customer.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/cards",
    request_body = SaveCardRequest,
    responses(
        (status = 200, description = "Card stored on file", body = CardResponse),
        (status = 400, description = "sourceId or customerId missing, or rejected by Square"),
        (status = 502, description = "Square unreachable")
    ),
    tag = "Square"
))]
pub async fn create_card_handler(
    State(state): State<Arc<SquareState>>,
    Json(payload): Json<SaveCardRequest>,
) -> Result<Json<CardResponse>, DetailingError> {
    let source_id = required(payload.source_id, "sourceId")?;
    let customer_id = required(payload.customer_id, "customerId")?;

    let card = state
        .square
        .create_card(CreateCardRequest {
            idempotency_key: Uuid::new_v4().to_string(),
            source_id,
            verification_token: payload.verification_token.filter(|t| !t.is_empty()),
            card: Card {
                customer_id: Some(customer_id),
                cardholder_name: payload.cardholder_name,
                ..Default::default()
            },
        })
        .await?;

    info!("[Square] Stored card {} on file", card.id);
    Ok(Json(CardResponse { card }))
}

// --- Payments ---

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentBody {
    pub source_id: Option<String>,
    pub amount_cents: Option<i64>,
    pub currency: Option<String>,
    pub customer_id: Option<String>,
    pub verification_token: Option<String>,
    pub booking_id: Option<String>,
    pub note: Option<String>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Serialize, Debug)]
pub struct PaymentResponse {
    pub payment: Payment,
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/payments",
    request_body = CreatePaymentBody,
    responses(
        (status = 200, description = "Payment created", body = PaymentResponse),
        (status = 400, description = "Missing sourceId or non-positive amount"),
        (status = 402, description = "Card declined (Square status passed through)")
    ),
    tag = "Square"
))]
pub async fn create_payment_handler(
    State(state): State<Arc<SquareState>>,
    Json(payload): Json<CreatePaymentBody>,
) -> Result<Json<PaymentResponse>, DetailingError> {
    let source_id = required(payload.source_id, "sourceId")?;
    let amount = match payload.amount_cents {
        Some(amount) if amount > 0 => amount,
        Some(_) => return Err(validation_error("amountCents must be positive")),
        None => return Err(validation_error("amountCents is required")),
    };
    let currency = payload
        .currency
        .filter(|c| !c.trim().is_empty())
        .map(|c| c.trim().to_uppercase())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    let payment = state
        .square
        .create_payment(CreatePaymentRequest {
            source_id,
            idempotency_key: Uuid::new_v4().to_string(),
            amount_money: Money { amount, currency },
            customer_id: payload.customer_id.filter(|c| !c.is_empty()),
            location_id: None,
            reference_id: payload.booking_id.filter(|b| !b.is_empty()),
            verification_token: payload.verification_token.filter(|t| !t.is_empty()),
            note: payload.note,
            autocomplete: Some(true),
        })
        .await?;

    info!("[Square] Payment {} created for {} minor units", payment.id, amount);
    Ok(Json(PaymentResponse { payment }))
}

#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListPaymentsQuery {
    pub begin_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Serialize, Debug)]
pub struct PaymentListResponse {
    pub payments: Vec<Payment>,
}

/// Lists payments for the admin dashboard.
#[axum::debug_handler(state = Arc<SquareState>)]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/payments",
    params(ListPaymentsQuery),
    responses(
        (status = 200, description = "Payments in the window", body = PaymentListResponse),
        (status = 401, description = "Admin session required")
    ),
    tag = "Square"
))]
pub async fn list_payments_handler(
    _admin: AdminSession,
    State(state): State<Arc<SquareState>>,
    Query(query): Query<ListPaymentsQuery>,
) -> Result<Json<PaymentListResponse>, DetailingError> {
    if let (Some(begin), Some(end)) = (query.begin_time, query.end_time) {
        if end < begin {
            return Err(validation_error("endTime must not be before beginTime"));
        }
    }

    let payments = state
        .square
        .list_payments(PaymentListQuery {
            begin_time: query.begin_time,
            end_time: query.end_time,
            location_id: None,
        })
        .await?;
    Ok(Json(PaymentListResponse { payments }))
}

// --- Customers ---

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpsertCustomerRequest {
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub email_address: Option<String>,
    pub phone_number: Option<String>,
    pub note: Option<String>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Serialize, Debug)]
pub struct CustomerResponse {
    pub customer: Customer,
    /// False when an existing customer matched by email or phone.
    pub created: bool,
}

/// Finds the customer by email, then phone; creates one when neither matches.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/customers",
    request_body = UpsertCustomerRequest,
    responses(
        (status = 200, description = "Existing or newly created customer", body = CustomerResponse),
        (status = 400, description = "Neither email nor phone given")
    ),
    tag = "Square"
))]
pub async fn upsert_customer_handler(
    State(state): State<Arc<SquareState>>,
    Json(payload): Json<UpsertCustomerRequest>,
) -> Result<Json<CustomerResponse>, DetailingError> {
    let email = payload
        .email_address
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty());
    let phone = payload
        .phone_number
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());
    if email.is_none() && phone.is_none() {
        return Err(validation_error("emailAddress or phoneNumber is required"));
    }

    if let Some(email) = &email {
        let found = state
            .square
            .search_customers(CustomerSearch {
                email_address: Some(email.clone()),
                phone_number: None,
            })
            .await?;
        if let Some(customer) = found.into_iter().next() {
            return Ok(Json(CustomerResponse {
                customer,
                created: false,
            }));
        }
    }
    if let Some(phone) = &phone {
        let found = state
            .square
            .search_customers(CustomerSearch {
                email_address: None,
                phone_number: Some(phone.clone()),
            })
            .await?;
        if let Some(customer) = found.into_iter().next() {
            return Ok(Json(CustomerResponse {
                customer,
                created: false,
            }));
        }
    }

    let customer = state
        .square
        .create_customer(
            Customer {
                given_name: payload.given_name,
                family_name: payload.family_name,
                email_address: email,
                phone_number: phone,
                note: payload.note,
                ..Default::default()
            },
            Uuid::new_v4().to_string(),
        )
        .await?;
    info!("[Square] Created customer {}", customer.id);
    Ok(Json(CustomerResponse {
        customer,
        created: true,
    }))
}

// --- Team members ---

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TeamMembersResponse {
    pub team_members: Vec<TeamMember>,
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/square/team-members",
    responses((status = 200, description = "Active team members", body = TeamMembersResponse)),
    tag = "Square"
))]
pub async fn list_team_members_handler(
    State(state): State<Arc<SquareState>>,
) -> Result<Json<TeamMembersResponse>, DetailingError> {
    let team_members = state.square.list_team_members().await?;
    Ok(Json(TeamMembersResponse { team_members }))
}
