// --- File: crates/detailing_square/src/client.rs ---
use crate::api::SquareApi;
use crate::error::SquareError;
use crate::models::{
    Booking, BookingListQuery, Card, CatalogObject, CreateCardRequest, CreatePaymentRequest,
    Customer, CustomerSearch, Location, Payment, PaymentListQuery, SquareApiError, TeamMember,
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use detailing_common::client_with_timeout;
use detailing_config::SquareConfig;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use uuid::Uuid;

const PAGE_LIMIT: &str = "100";
const CATALOG_TYPES: &str = "ITEM,CATEGORY,ITEM_VARIATION";

/// HTTP client for Square's REST API.
pub struct SquareClient {
    http: Client,
    base_url: String,
    access_token: String,
    api_version: String,
    configured_location_id: Option<String>,
    location_id: OnceCell<String>,
}

impl SquareClient {
    /// Builds a client from configuration. Fails when no access token is set.
    pub fn from_config(config: &SquareConfig) -> Result<Self, SquareError> {
        let access_token = config
            .access_token()
            .ok_or_else(|| SquareError::ConfigError("SQUARE_ACCESS_TOKEN is not set".to_string()))?;
        let http = client_with_timeout(config.timeout_secs)?;

        let mut client = Self::new(http, config.base_url(), access_token)
            .with_api_version(config.api_version.clone());
        if let Some(location_id) = config.location_id() {
            client = client.with_location_id(location_id);
        }
        info!(
            "[Square] Client ready for {} (version {})",
            client.base_url, client.api_version
        );
        Ok(client)
    }

    pub fn new(http: Client, base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            api_version: SquareConfig::default().api_version,
            configured_location_id: None,
            location_id: OnceCell::new(),
        }
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_location_id(mut self, location_id: impl Into<String>) -> Self {
        self.configured_location_id = Some(location_id.into());
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.access_token)
            .header("Square-Version", &self.api_version)
            .header(ACCEPT, "application/json")
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SquareError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("[Square] API error status {}: {}", status, body);
            let errors = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.errors)
                .unwrap_or_default();
            if errors.is_empty() {
                return Err(SquareError::Api {
                    status_code: status.as_u16(),
                    errors,
                    message: body,
                });
            }
            return Err(SquareError::api(status.as_u16(), errors));
        }

        debug!("[Square] API response status {}", status);
        Ok(serde_json::from_str(&body)?)
    }

    /// Fills in the location when the caller left it out.
    async fn location_or_default(&self, location_id: Option<String>) -> Result<String, SquareError> {
        match location_id.filter(|id| !id.is_empty()) {
            Some(id) => Ok(id),
            None => self.location_id().await,
        }
    }
}

fn rfc3339(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// --- Response envelopes ---

#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<SquareApiError>,
}

#[derive(Deserialize)]
struct BookingEnvelope {
    booking: Option<Booking>,
}

#[derive(Deserialize)]
struct BookingsPage {
    #[serde(default)]
    bookings: Vec<Booking>,
    cursor: Option<String>,
}

#[derive(Deserialize)]
struct PaymentEnvelope {
    payment: Option<Payment>,
}

#[derive(Deserialize)]
struct PaymentsPage {
    #[serde(default)]
    payments: Vec<Payment>,
    cursor: Option<String>,
}

#[derive(Deserialize)]
struct CardEnvelope {
    card: Option<Card>,
}

#[derive(Deserialize)]
struct CustomerEnvelope {
    customer: Option<Customer>,
}

#[derive(Deserialize)]
struct CustomersPage {
    #[serde(default)]
    customers: Vec<Customer>,
}

#[derive(Deserialize)]
struct CatalogPage {
    #[serde(default)]
    objects: Vec<CatalogObject>,
    cursor: Option<String>,
}

#[derive(Deserialize)]
struct CatalogObjectEnvelope {
    object: Option<CatalogObject>,
}

#[derive(Deserialize)]
struct TeamMembersPage {
    #[serde(default)]
    team_members: Vec<TeamMember>,
    cursor: Option<String>,
}

#[derive(Deserialize)]
struct LocationsEnvelope {
    #[serde(default)]
    locations: Vec<Location>,
}

#[async_trait]
impl SquareApi for SquareClient {
    async fn list_bookings(&self, query: BookingListQuery) -> Result<Vec<Booking>, SquareError> {
        let mut params: Vec<(&str, String)> = vec![("limit", PAGE_LIMIT.to_string())];
        if let Some(min) = &query.start_at_min {
            params.push(("start_at_min", rfc3339(min)));
        }
        if let Some(max) = &query.start_at_max {
            params.push(("start_at_max", rfc3339(max)));
        }
        if let Some(location_id) = query.location_id {
            params.push(("location_id", location_id));
        }
        if let Some(customer_id) = query.customer_id {
            params.push(("customer_id", customer_id));
        }
        if let Some(team_member_id) = query.team_member_id {
            params.push(("team_member_id", team_member_id));
        }

        let mut bookings = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut page_params = params.clone();
            if let Some(c) = cursor.take() {
                page_params.push(("cursor", c));
            }
            let page: BookingsPage = self
                .send(self.request(Method::GET, "/v2/bookings").query(&page_params))
                .await?;
            bookings.extend(page.bookings);
            match page.cursor.filter(|c| !c.is_empty()) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        debug!("[Square] Listed {} bookings", bookings.len());
        Ok(bookings)
    }

    async fn retrieve_booking(&self, booking_id: &str) -> Result<Booking, SquareError> {
        let envelope: BookingEnvelope = self
            .send(self.request(Method::GET, &format!("/v2/bookings/{}", booking_id)))
            .await?;
        envelope.booking.ok_or(SquareError::MissingField("booking"))
    }

    async fn create_booking(
        &self,
        mut booking: Booking,
        idempotency_key: String,
    ) -> Result<Booking, SquareError> {
        booking.location_id = Some(self.location_or_default(booking.location_id.take()).await?);
        let body = json!({ "idempotency_key": idempotency_key, "booking": booking });
        let envelope: BookingEnvelope = self
            .send(self.request(Method::POST, "/v2/bookings").json(&body))
            .await?;
        envelope.booking.ok_or(SquareError::MissingField("booking"))
    }

    async fn update_booking(&self, booking_id: &str, booking: Booking) -> Result<Booking, SquareError> {
        let body = json!({
            "idempotency_key": Uuid::new_v4().to_string(),
            "booking": booking,
        });
        let envelope: BookingEnvelope = self
            .send(
                self.request(Method::PUT, &format!("/v2/bookings/{}", booking_id))
                    .json(&body),
            )
            .await?;
        envelope.booking.ok_or(SquareError::MissingField("booking"))
    }

    async fn cancel_booking(
        &self,
        booking_id: &str,
        booking_version: Option<i64>,
    ) -> Result<Booking, SquareError> {
        let mut body = json!({ "idempotency_key": Uuid::new_v4().to_string() });
        if let Some(version) = booking_version {
            body["booking_version"] = json!(version);
        }
        let envelope: BookingEnvelope = self
            .send(
                self.request(Method::POST, &format!("/v2/bookings/{}/cancel", booking_id))
                    .json(&body),
            )
            .await?;
        envelope.booking.ok_or(SquareError::MissingField("booking"))
    }

    async fn create_payment(&self, mut request: CreatePaymentRequest) -> Result<Payment, SquareError> {
        request.location_id = Some(self.location_or_default(request.location_id.take()).await?);
        let envelope: PaymentEnvelope = self
            .send(self.request(Method::POST, "/v2/payments").json(&request))
            .await?;
        envelope.payment.ok_or(SquareError::MissingField("payment"))
    }

    async fn list_payments(&self, query: PaymentListQuery) -> Result<Vec<Payment>, SquareError> {
        let mut params: Vec<(&str, String)> = vec![("limit", PAGE_LIMIT.to_string())];
        if let Some(begin) = &query.begin_time {
            params.push(("begin_time", rfc3339(begin)));
        }
        if let Some(end) = &query.end_time {
            params.push(("end_time", rfc3339(end)));
        }
        if let Some(location_id) = query.location_id {
            params.push(("location_id", location_id));
        }

        let mut payments = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut page_params = params.clone();
            if let Some(c) = cursor.take() {
                page_params.push(("cursor", c));
            }
            let page: PaymentsPage = self
                .send(self.request(Method::GET, "/v2/payments").query(&page_params))
                .await?;
            payments.extend(page.payments);
            match page.cursor.filter(|c| !c.is_empty()) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(payments)
    }

    async fn create_card(&self, request: CreateCardRequest) -> Result<Card, SquareError> {
        let envelope: CardEnvelope = self
            .send(self.request(Method::POST, "/v2/cards").json(&request))
            .await?;
        envelope.card.ok_or(SquareError::MissingField("card"))
    }

    async fn search_customers(&self, search: CustomerSearch) -> Result<Vec<Customer>, SquareError> {
        let filter = match (search.email_address, search.phone_number) {
            (Some(email), _) => json!({ "email_address": { "exact": email } }),
            (None, Some(phone)) => json!({ "phone_number": { "exact": phone } }),
            (None, None) => return Ok(Vec::new()),
        };
        let body = json!({ "query": { "filter": filter }, "limit": 10 });
        let page: CustomersPage = self
            .send(self.request(Method::POST, "/v2/customers/search").json(&body))
            .await?;
        Ok(page.customers)
    }

    async fn create_customer(
        &self,
        customer: Customer,
        idempotency_key: String,
    ) -> Result<Customer, SquareError> {
        let mut body = serde_json::to_value(&customer)?;
        body["idempotency_key"] = json!(idempotency_key);
        let envelope: CustomerEnvelope = self
            .send(self.request(Method::POST, "/v2/customers").json(&body))
            .await?;
        envelope.customer.ok_or(SquareError::MissingField("customer"))
    }

    async fn list_catalog(&self) -> Result<Vec<CatalogObject>, SquareError> {
        let mut objects = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut params: Vec<(&str, String)> = vec![("types", CATALOG_TYPES.to_string())];
            if let Some(c) = cursor.take() {
                params.push(("cursor", c));
            }
            let page: CatalogPage = self
                .send(self.request(Method::GET, "/v2/catalog/list").query(&params))
                .await?;
            objects.extend(page.objects);
            match page.cursor.filter(|c| !c.is_empty()) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        debug!("[Square] Listed {} catalog objects", objects.len());
        Ok(objects)
    }

    async fn retrieve_catalog_object(&self, object_id: &str) -> Result<CatalogObject, SquareError> {
        let envelope: CatalogObjectEnvelope = self
            .send(self.request(Method::GET, &format!("/v2/catalog/object/{}", object_id)))
            .await?;
        envelope.object.ok_or(SquareError::MissingField("object"))
    }

    async fn list_team_members(&self) -> Result<Vec<TeamMember>, SquareError> {
        let mut members = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut body = json!({
                "query": { "filter": { "status": "ACTIVE" } },
                "limit": 100,
            });
            if let Some(c) = cursor.take() {
                body["cursor"] = json!(c);
            }
            let page: TeamMembersPage = self
                .send(self.request(Method::POST, "/v2/team-members/search").json(&body))
                .await?;
            members.extend(page.team_members);
            match page.cursor.filter(|c| !c.is_empty()) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(members)
    }

    async fn location_id(&self) -> Result<String, SquareError> {
        let id = self
            .location_id
            .get_or_try_init(|| async {
                if let Some(id) = &self.configured_location_id {
                    return Ok(id.clone());
                }
                let envelope: LocationsEnvelope = self
                    .send(self.request(Method::GET, "/v2/locations"))
                    .await?;
                let location = envelope
                    .locations
                    .into_iter()
                    .find(|l| l.status.as_deref() == Some("ACTIVE"))
                    .ok_or(SquareError::MissingField("locations"))?;
                info!("[Square] Using location {}", location.id);
                Ok::<_, SquareError>(location.id)
            })
            .await?;
        Ok(id.clone())
    }
}
