// --- File: crates/detailing_booking/src/handlers.rs ---
use crate::availability::{
    calculate_availability, fetch_bookings, AvailabilityDay, AvailabilitySettings, DateRange,
};
use crate::catalog::{build_catalog, fallback_catalog, object_duration, CatalogShape, FALLBACK_ID_PREFIX};
use crate::error::BookingError;
use crate::no_show::{ChargeReceipt, NoShowCollector, NoShowRunReport, NoShowSettings};
use crate::records::{PaymentRecord, PaymentRecordStore};
use crate::seller_note;
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::{DateTime, Duration, Utc};
use detailing_admin::{AdminSession, CronCaller, HasSessionGuard, SessionGuard};
use detailing_common::DetailingError;
use detailing_square::models::{AppointmentSegment, Booking, BookingStatus};
use detailing_square::SquareApi;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Default window of the admin booking list.
const DEFAULT_LIST_DAYS: i64 = 31;

// --- State for Booking Handlers ---
#[derive(Clone)]
pub struct BookingState {
    pub square: Arc<dyn SquareApi>,
    pub records: Arc<dyn PaymentRecordStore>,
    pub collector: Arc<NoShowCollector>,
    pub guard: Arc<SessionGuard>,
    pub availability: AvailabilitySettings,
}

impl BookingState {
    pub fn new(
        square: Arc<dyn SquareApi>,
        records: Arc<dyn PaymentRecordStore>,
        guard: Arc<SessionGuard>,
        availability: AvailabilitySettings,
        no_show: NoShowSettings,
    ) -> Self {
        let collector = Arc::new(NoShowCollector::new(square.clone(), records.clone(), no_show));
        Self {
            square,
            records,
            collector,
            guard,
            availability,
        }
    }
}

impl HasSessionGuard for BookingState {
    fn session_guard(&self) -> &SessionGuard {
        &self.guard
    }
}

fn parse_param<T: FromStr>(value: Option<&str>, field: &str) -> Result<Option<T>, BookingError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| BookingError::InvalidRequest(format!("{} must be a number, got '{}'", field, raw))),
    }
}

fn require_param<T: FromStr>(value: Option<&str>, field: &str) -> Result<T, BookingError> {
    parse_param(value, field)?.ok_or_else(|| BookingError::InvalidRequest(format!("{} is required", field)))
}

fn required_text(value: Option<String>, field: &str) -> Result<String, BookingError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| BookingError::InvalidRequest(format!("{} is required", field)))
}

fn parse_instant(value: &str, field: &str) -> Result<DateTime<Utc>, BookingError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| BookingError::InvalidRequest(format!("{} must be an RFC 3339 timestamp", field)))
}

async fn retrieve_booking(square: &dyn SquareApi, booking_id: &str) -> Result<Booking, BookingError> {
    square.retrieve_booking(booking_id).await.map_err(|e| {
        if e.is_not_found() {
            BookingError::NotFound(booking_id.to_string())
        } else {
            BookingError::Square(e)
        }
    })
}

// --- Availability ---

/// All parameters arrive as text so malformed numbers yield a JSON 400.
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    /// 1 to 12
    pub month: Option<String>,
    pub year: Option<String>,
    /// Restrict the answer to one day of the month.
    pub day: Option<String>,
    /// Days only count as available when this service still fits.
    pub service_variation_id: Option<String>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub year: i32,
    pub month: u32,
    pub time_zone: String,
    pub required_minutes: i64,
    pub availability: Vec<AvailabilityDay>,
}

/// Duration of the requested service; 0 when none is given or it is unknown.
async fn required_minutes(square: &dyn SquareApi, variation_id: Option<&str>) -> i64 {
    let variation_id = match variation_id.map(str::trim).filter(|v| !v.is_empty()) {
        Some(id) => id,
        None => return 0,
    };
    if variation_id.starts_with(FALLBACK_ID_PREFIX) {
        return fallback_catalog()
            .variation(variation_id)
            .map(|v| v.duration_minutes)
            .unwrap_or(0);
    }
    match square.retrieve_catalog_object(variation_id).await {
        Ok(object) => object_duration(&object).unwrap_or(0),
        Err(e) => {
            warn!("[Availability] Unknown service variation {}: {}", variation_id, e);
            0
        }
    }
}

async fn availability_for(
    state: &BookingState,
    query: &AvailabilityQuery,
) -> Result<AvailabilityResponse, BookingError> {
    let month: u32 = require_param(query.month.as_deref(), "month")?;
    let year: i32 = require_param(query.year.as_deref(), "year")?;
    let day: Option<u32> = parse_param(query.day.as_deref(), "day")?;
    let range = DateRange::for_month(year, month, day)?;

    let settings = &state.availability;
    let required = required_minutes(state.square.as_ref(), query.service_variation_id.as_deref()).await;
    let (start, end) = range.utc_bounds(settings.time_zone);
    let bookings = fetch_bookings(state.square.as_ref(), start, end).await?;

    Ok(AvailabilityResponse {
        year,
        month,
        time_zone: settings.time_zone.name().to_string(),
        required_minutes: required,
        availability: calculate_availability(&range, &bookings, required, settings),
    })
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/bookings/availability/search",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Working days of the month with remaining capacity", body = AvailabilityResponse),
        (status = 400, description = "Missing or invalid month, year or day")
    ),
    tag = "Bookings"
))]
pub async fn search_availability_handler(
    State(state): State<Arc<BookingState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, DetailingError> {
    Ok(Json(availability_for(&state, &query).await?))
}

/// Month availability without a service filter.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/availability",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Working days of the month", body = AvailabilityResponse),
        (status = 400, description = "Missing or invalid month or year")
    ),
    tag = "Bookings"
))]
pub async fn month_availability_handler(
    State(state): State<Arc<BookingState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, DetailingError> {
    let query = AvailabilityQuery {
        month: query.month,
        year: query.year,
        ..Default::default()
    };
    Ok(Json(availability_for(&state, &query).await?))
}

// --- Bookings ---

#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListBookingsQuery {
    /// RFC 3339; defaults to now.
    pub start_at_min: Option<String>,
    /// RFC 3339; defaults to 31 days after `startAtMin`.
    pub start_at_max: Option<String>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Serialize, Debug)]
pub struct BookingListResponse {
    pub bookings: Vec<Booking>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Serialize, Debug)]
pub struct BookingResponse {
    pub booking: Booking,
}

#[axum::debug_handler(state = Arc<BookingState>)]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/square/bookings",
    params(ListBookingsQuery),
    responses(
        (status = 200, description = "Bookings starting in the window", body = BookingListResponse),
        (status = 400, description = "Invalid timestamps"),
        (status = 401, description = "Admin session required")
    ),
    tag = "Bookings"
))]
pub async fn list_bookings_handler(
    _admin: AdminSession,
    State(state): State<Arc<BookingState>>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<BookingListResponse>, DetailingError> {
    let start = match query.start_at_min.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(raw) => parse_instant(raw, "startAtMin")?,
        None => Utc::now(),
    };
    let end = match query.start_at_max.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(raw) => parse_instant(raw, "startAtMax")?,
        None => start + Duration::days(DEFAULT_LIST_DAYS),
    };
    if end <= start {
        return Err(BookingError::InvalidRequest("startAtMax must be after startAtMin".to_string()).into());
    }

    let mut bookings = fetch_bookings(state.square.as_ref(), start, end).await?;
    bookings.sort_by_key(|b| b.start_at);
    Ok(Json(BookingListResponse { bookings }))
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    /// RFC 3339 start of the appointment.
    pub start_at: Option<String>,
    pub service_variation_id: Option<String>,
    pub customer_id: Option<String>,
    /// Defaults to the first active team member.
    pub team_member_id: Option<String>,
    /// Overrides the catalog duration.
    pub duration_minutes: Option<i64>,
    pub customer_note: Option<String>,
    /// Card on file used for a later no-show fee.
    pub card_id: Option<String>,
    /// Service price; defaults to the catalog price.
    pub amount_cents: Option<i64>,
    pub currency: Option<String>,
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/square/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 200, description = "Booking created", body = BookingResponse),
        (status = 400, description = "Missing fields or unknown service"),
        (status = 409, description = "Slot rejected by Square")
    ),
    tag = "Bookings"
))]
pub async fn create_booking_handler(
    State(state): State<Arc<BookingState>>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<Json<BookingResponse>, DetailingError> {
    let start_at = parse_instant(&required_text(payload.start_at, "startAt")?, "startAt")?;
    let variation_id = required_text(payload.service_variation_id, "serviceVariationId")?;
    let customer_id = required_text(payload.customer_id, "customerId")?;
    if payload.amount_cents.is_some_and(|a| a <= 0) {
        return Err(BookingError::InvalidRequest("amountCents must be positive".to_string()).into());
    }
    if variation_id.starts_with(FALLBACK_ID_PREFIX) {
        return Err(BookingError::InvalidRequest(
            "the service catalog is unavailable; this service cannot be booked right now".to_string(),
        )
        .into());
    }

    let variation = state
        .square
        .retrieve_catalog_object(&variation_id)
        .await
        .map_err(|e| {
            if e.is_not_found() {
                BookingError::InvalidRequest(format!("unknown serviceVariationId {}", variation_id))
            } else {
                BookingError::Square(e)
            }
        })?;
    let catalog_price = variation
        .item_variation_data
        .as_ref()
        .and_then(|v| v.price_money.clone());

    let team_member_id = match payload.team_member_id.filter(|t| !t.trim().is_empty()) {
        Some(id) => id,
        None => state
            .square
            .list_team_members()
            .await?
            .into_iter()
            .next()
            .map(|m| m.id)
            .ok_or_else(|| BookingError::InvalidRequest("teamMemberId is required; no active team member found".to_string()))?,
    };

    let card_id = payload.card_id.filter(|c| !c.trim().is_empty());
    let amount_cents = payload
        .amount_cents
        .or_else(|| catalog_price.as_ref().map(|m| m.amount));
    let currency = payload
        .currency
        .filter(|c| !c.trim().is_empty())
        .map(|c| c.trim().to_uppercase())
        .or_else(|| catalog_price.map(|m| m.currency));

    // Kept in the note so the fee can still be collected if the record store is lost.
    let seller_note = card_id.as_deref().map(|card| {
        seller_note::payment_lines(
            card,
            amount_cents,
            currency.as_deref().unwrap_or(crate::no_show::DEFAULT_FEE_CURRENCY),
        )
    });

    let booking = Booking {
        start_at: Some(start_at),
        customer_id: Some(customer_id.clone()),
        customer_note: payload.customer_note.filter(|n| !n.trim().is_empty()),
        seller_note,
        appointment_segments: vec![AppointmentSegment {
            duration_minutes: payload
                .duration_minutes
                .filter(|m| *m > 0)
                .or_else(|| object_duration(&variation)),
            service_variation_id: Some(variation_id),
            team_member_id: Some(team_member_id),
            service_variation_version: variation.version,
        }],
        ..Default::default()
    };

    let created = state
        .square
        .create_booking(booking, Uuid::new_v4().to_string())
        .await?;
    if let Some(card_id) = card_id {
        state.records.save_details(
            &created.id,
            PaymentRecord::new(card_id, Some(customer_id), amount_cents, currency),
        );
    }
    info!("[Bookings] Created booking {}", created.id);
    Ok(Json(BookingResponse { booking: created }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    Accept,
    Decline,
    NoShow,
    Cancel,
    Note,
}

impl FromStr for BookingAction {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "accept" => Ok(BookingAction::Accept),
            "decline" => Ok(BookingAction::Decline),
            "no_show" => Ok(BookingAction::NoShow),
            "cancel" => Ok(BookingAction::Cancel),
            "note" => Ok(BookingAction::Note),
            other => Err(BookingError::InvalidRequest(format!(
                "unknown action '{}'; expected accept, decline, no_show, cancel or note",
                other
            ))),
        }
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingRequest {
    /// accept, decline, no_show, cancel or note
    pub action: Option<String>,
    /// Replacement text for the `note` action.
    pub seller_note: Option<String>,
}

#[axum::debug_handler(state = Arc<BookingState>)]
#[cfg_attr(feature = "openapi", utoipa::path(
    patch,
    path = "/square/bookings/{id}",
    params(("id" = String, Path, description = "Square booking id")),
    request_body = UpdateBookingRequest,
    responses(
        (status = 200, description = "Updated booking", body = BookingResponse),
        (status = 400, description = "Unknown action or transition not allowed"),
        (status = 401, description = "Admin session required"),
        (status = 404, description = "Booking not found")
    ),
    tag = "Bookings"
))]
pub async fn update_booking_handler(
    _admin: AdminSession,
    State(state): State<Arc<BookingState>>,
    Path(booking_id): Path<String>,
    Json(payload): Json<UpdateBookingRequest>,
) -> Result<Json<BookingResponse>, DetailingError> {
    let action: BookingAction = required_text(payload.action, "action")?.parse()?;
    let current = retrieve_booking(state.square.as_ref(), &booking_id).await?;

    if current.status().is_cancelled() && action != BookingAction::Note {
        return Err(BookingError::InvalidState(format!("Booking {} is already cancelled", booking_id)).into());
    }

    let status = match action {
        BookingAction::Cancel => {
            let cancelled = state.square.cancel_booking(&booking_id, current.version).await?;
            info!("[Bookings] Booking {} cancelled by admin", booking_id);
            return Ok(Json(BookingResponse { booking: cancelled }));
        }
        BookingAction::Note => None,
        BookingAction::Accept => Some(BookingStatus::Accepted),
        BookingAction::Decline => Some(BookingStatus::Declined),
        BookingAction::NoShow => Some(BookingStatus::NoShow),
    };

    let update = match status {
        Some(status) => Booking {
            version: current.version,
            status: Some(status),
            ..Default::default()
        },
        None => {
            let text = payload.seller_note.unwrap_or_default();
            Booking {
                version: current.version,
                seller_note: Some(seller_note::replace_text(current.seller_note.as_deref(), &text)),
                ..Default::default()
            }
        }
    };
    let updated = state.square.update_booking(&booking_id, update).await?;
    info!("[Bookings] Booking {} updated ({:?})", booking_id, action);
    Ok(Json(BookingResponse { booking: updated }))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/bookings/{id}",
    params(("id" = String, Path, description = "Square booking id")),
    responses(
        (status = 200, description = "Cancelled booking", body = BookingResponse),
        (status = 400, description = "Booking already cancelled (INVALID_BOOKING_STATE)"),
        (status = 404, description = "Booking not found")
    ),
    tag = "Bookings"
))]
pub async fn cancel_booking_handler(
    State(state): State<Arc<BookingState>>,
    Path(booking_id): Path<String>,
) -> Result<Json<BookingResponse>, DetailingError> {
    let current = retrieve_booking(state.square.as_ref(), &booking_id).await?;
    if current.status().is_cancelled() {
        return Err(BookingError::InvalidState(format!("Booking {} is already cancelled", booking_id)).into());
    }
    let cancelled = state.square.cancel_booking(&booking_id, current.version).await?;
    info!("[Bookings] Booking {} cancelled", booking_id);
    Ok(Json(BookingResponse { booking: cancelled }))
}

// --- No-show fees ---

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Serialize, Debug)]
pub struct ChargeNoShowResponse {
    pub success: bool,
    #[serde(flatten)]
    pub receipt: ChargeReceipt,
}

#[axum::debug_handler(state = Arc<BookingState>)]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/bookings/{id}/charge-no-show",
    params(("id" = String, Path, description = "Square booking id")),
    responses(
        (status = 200, description = "Fee charged", body = ChargeNoShowResponse),
        (status = 400, description = "Missing payment details or booking not chargeable"),
        (status = 401, description = "Admin session required"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Fee already charged")
    ),
    tag = "Bookings"
))]
pub async fn charge_no_show_handler(
    _admin: AdminSession,
    State(state): State<Arc<BookingState>>,
    Path(booking_id): Path<String>,
) -> Result<Json<ChargeNoShowResponse>, DetailingError> {
    let receipt = state.collector.charge_booking(&booking_id).await?;
    Ok(Json(ChargeNoShowResponse {
        success: true,
        receipt,
    }))
}

#[axum::debug_handler(state = Arc<BookingState>)]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/cron/no-show-check",
    responses(
        (status = 200, description = "Per-booking results of the scan", body = NoShowRunReport),
        (status = 401, description = "Neither the cron secret nor an admin session was presented"),
        (status = 409, description = "A scan is already running")
    ),
    tag = "Bookings"
))]
pub async fn no_show_check_handler(
    caller: CronCaller,
    State(state): State<Arc<BookingState>>,
) -> Result<Json<NoShowRunReport>, DetailingError> {
    info!("[NoShow] Scan triggered by {:?}", caller);
    Ok(Json(state.collector.run(Utc::now()).await?))
}

// --- Catalog ---

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/catalog",
    responses((status = 200, description = "Shaped catalog, or the built-in price list", body = CatalogShape)),
    tag = "Bookings"
))]
pub async fn catalog_handler(State(state): State<Arc<BookingState>>) -> Json<CatalogShape> {
    Json(build_catalog(state.square.list_catalog().await))
}
