// --- File: crates/detailing_booking/src/records.rs ---

//! Payment metadata per booking, and the claim that keeps a no-show fee from
//! being charged twice.
//!
//! A collector must `try_claim` a booking before charging it, then either
//! `commit` the payment id or `release` the claim. While a claim is held every
//! other claim attempt for the same booking fails. A claim is also refused when
//! the caller read the booking at an older version than the last claim.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub card_id: Option<String>,
    pub customer_id: Option<String>,
    pub amount_cents: Option<i64>,
    pub currency: Option<String>,
    pub charged_payment_id: Option<String>,
    /// Booking version the latest claim was taken at.
    pub claimed_version: Option<i64>,
    #[serde(skip)]
    claimed: bool,
}

impl PaymentRecord {
    pub fn new(
        card_id: impl Into<String>,
        customer_id: Option<String>,
        amount_cents: Option<i64>,
        currency: Option<String>,
    ) -> Self {
        Self {
            card_id: Some(card_id.into()),
            customer_id,
            amount_cents,
            currency,
            ..Default::default()
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Claimed,
    AlreadyCharged(String),
    HeldElsewhere,
    /// The booking was claimed at a newer version than the one presented.
    Stale { claimed_version: i64 },
}

pub trait PaymentRecordStore: Send + Sync {
    fn get(&self, booking_id: &str) -> Option<PaymentRecord>;

    /// Stores card and price details, keeping any charge or claim state.
    fn save_details(&self, booking_id: &str, record: PaymentRecord);

    fn try_claim(&self, booking_id: &str, booking_version: Option<i64>) -> ClaimOutcome;

    /// Records the payment and drops the claim.
    fn commit(&self, booking_id: &str, payment_id: &str);

    fn release(&self, booking_id: &str);
}

/// Process-local record store.
#[derive(Debug, Default)]
pub struct InMemoryPaymentRecordStore {
    records: Mutex<HashMap<String, PaymentRecord>>,
}

impl InMemoryPaymentRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, PaymentRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PaymentRecordStore for InMemoryPaymentRecordStore {
    fn get(&self, booking_id: &str) -> Option<PaymentRecord> {
        self.lock().get(booking_id).cloned()
    }

    fn save_details(&self, booking_id: &str, record: PaymentRecord) {
        let mut records = self.lock();
        let entry = records.entry(booking_id.to_string()).or_default();
        entry.card_id = record.card_id.or(entry.card_id.take());
        entry.customer_id = record.customer_id.or(entry.customer_id.take());
        entry.amount_cents = record.amount_cents.or(entry.amount_cents);
        entry.currency = record.currency.or(entry.currency.take());
    }

    fn try_claim(&self, booking_id: &str, booking_version: Option<i64>) -> ClaimOutcome {
        let mut records = self.lock();
        let entry = records.entry(booking_id.to_string()).or_default();
        if let Some(payment_id) = &entry.charged_payment_id {
            return ClaimOutcome::AlreadyCharged(payment_id.clone());
        }
        if entry.claimed {
            return ClaimOutcome::HeldElsewhere;
        }
        if let (Some(claimed), Some(presented)) = (entry.claimed_version, booking_version) {
            if presented < claimed {
                return ClaimOutcome::Stale { claimed_version: claimed };
            }
        }
        entry.claimed = true;
        entry.claimed_version = booking_version;
        ClaimOutcome::Claimed
    }

    fn commit(&self, booking_id: &str, payment_id: &str) {
        let mut records = self.lock();
        let entry = records.entry(booking_id.to_string()).or_default();
        entry.charged_payment_id = Some(payment_id.to_string());
        entry.claimed = false;
    }

    fn release(&self, booking_id: &str) {
        if let Some(entry) = self.lock().get_mut(booking_id) {
            entry.claimed = false;
        }
    }
}
