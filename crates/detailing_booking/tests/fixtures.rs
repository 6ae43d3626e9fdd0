//! Shared builders for the booking API tests.

use axum::body::Body;
use axum::http::{header, Request, Response};
use chrono::{DateTime, TimeZone, Utc};
use detailing_admin::{InMemorySessionStore, SessionGuard, SESSION_COOKIE};
use detailing_booking::availability::AvailabilitySettings;
use detailing_booking::no_show::NoShowSettings;
use detailing_booking::records::InMemoryPaymentRecordStore;
use detailing_booking::{routes_with_state, BookingState};
use detailing_square::mock::MockSquare;
use detailing_square::models::{AppointmentSegment, Booking, BookingStatus};
use serde_json::Value;
use std::sync::Arc;

pub const ADMIN_PASSWORD: &str = "hunter2";
pub const CRON_SECRET: &str = "cron-s3cret";

pub struct TestApp {
    pub router: axum::Router,
    pub records: Arc<InMemoryPaymentRecordStore>,
    pub guard: Arc<SessionGuard>,
}

impl TestApp {
    pub fn new(mock: MockSquare) -> Self {
        let guard = Arc::new(
            SessionGuard::new(
                Arc::new(InMemorySessionStore::new(10)),
                Some(ADMIN_PASSWORD.to_string()),
            )
            .with_cron_secret(Some(CRON_SECRET.to_string())),
        );
        let records = Arc::new(InMemoryPaymentRecordStore::new());
        let state = BookingState::new(
            Arc::new(mock),
            records.clone(),
            guard.clone(),
            AvailabilitySettings::default(),
            NoShowSettings::default(),
        );
        Self {
            router: routes_with_state(Arc::new(state)),
            records,
            guard,
        }
    }

    /// `Cookie` header value of a fresh admin session.
    pub fn admin_cookie(&self) -> String {
        let token = self.guard.authenticate(ADMIN_PASSWORD).unwrap();
        format!("{}={}", SESSION_COOKIE, token)
    }
}

pub fn request(method: &str, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 14, 0, 0).unwrap()
}

pub fn booking(id: &str, status: BookingStatus) -> Booking {
    Booking {
        id: id.to_string(),
        version: Some(1),
        status: Some(status),
        start_at: Some(start()),
        customer_id: Some("cust-1".to_string()),
        appointment_segments: vec![AppointmentSegment {
            duration_minutes: Some(120),
            service_variation_id: Some("var-int-s".to_string()),
            team_member_id: Some("tm-1".to_string()),
            service_variation_version: Some(7),
        }],
        ..Default::default()
    }
}
