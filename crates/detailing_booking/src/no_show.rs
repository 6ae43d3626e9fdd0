// --- File: crates/detailing_booking/src/no_show.rs ---

//! Collects the no-show fee from the card on file of customers who missed an
//! accepted booking.
//!
//! Payment details come from the record store, or from the legacy lines in the
//! booking's seller note. Before charging, the collector claims the booking in
//! the record store; a booking that is already charged or claimed is skipped.
//! After the payment succeeds the claim is committed and a marker line is
//! appended to the seller note.

use crate::availability::fetch_bookings;
use crate::error::BookingError;
use crate::records::{ClaimOutcome, PaymentRecord, PaymentRecordStore};
use crate::seller_note;
use chrono::{DateTime, Duration, Utc};
use detailing_config::NoShowConfig;
use detailing_square::models::{Booking, BookingStatus, CreatePaymentRequest, Money};
use detailing_square::SquareApi;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const DEFAULT_FEE_CURRENCY: &str = "USD";

#[derive(Debug, Clone)]
pub struct NoShowSettings {
    pub fee_percent: u32,
    /// How long after its start a booking becomes chargeable.
    pub min_age: Duration,
    pub lookback: Duration,
}

impl NoShowSettings {
    pub fn from_config(config: &NoShowConfig) -> Self {
        Self {
            fee_percent: config.fee_percent,
            min_age: Duration::hours(config.min_age_hours),
            lookback: Duration::days(config.lookback_days),
        }
    }
}

impl Default for NoShowSettings {
    fn default() -> Self {
        Self::from_config(&NoShowConfig::default())
    }
}

/// `percent` of `amount_cents`, rounded down.
pub fn no_show_fee(amount_cents: i64, percent: u32) -> i64 {
    let fee = i128::from(amount_cents) * i128::from(percent) / 100;
    i64::try_from(fee).unwrap_or(i64::MAX)
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoShowStatus {
    Charged,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyCharged(String),
    NoPaymentDetails,
    NoAmount,
    ClaimedElsewhere,
    StaleVersion,
    ZeroFee,
}

impl SkipReason {
    fn describe(&self) -> String {
        match self {
            SkipReason::AlreadyCharged(payment_id) => format!("already charged (payment {})", payment_id),
            SkipReason::NoPaymentDetails => "no payment details".to_string(),
            SkipReason::NoAmount => "no service amount".to_string(),
            SkipReason::ClaimedElsewhere => "being charged by another run".to_string(),
            SkipReason::StaleVersion => "booking changed since it was read".to_string(),
            SkipReason::ZeroFee => "fee rounds to zero".to_string(),
        }
    }

    fn into_error(self, booking_id: &str) -> BookingError {
        match self {
            SkipReason::AlreadyCharged(payment_id) => BookingError::AlreadyCharged {
                booking_id: booking_id.to_string(),
                payment_id,
            },
            SkipReason::NoPaymentDetails | SkipReason::NoAmount => {
                BookingError::MissingPaymentDetails(booking_id.to_string())
            }
            SkipReason::ClaimedElsewhere | SkipReason::StaleVersion => {
                BookingError::ClaimedElsewhere(booking_id.to_string())
            }
            SkipReason::ZeroFee => {
                BookingError::InvalidRequest(format!("no-show fee for booking {} rounds to zero", booking_id))
            }
        }
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeReceipt {
    pub booking_id: String,
    pub payment_id: String,
    pub fee_cents: i64,
    pub currency: String,
    /// False when the payment went through but the seller note could not be updated.
    pub note_updated: bool,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoShowResult {
    pub booking_id: String,
    pub status: NoShowStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_cents: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_updated: Option<bool>,
}

impl NoShowResult {
    fn charged(receipt: ChargeReceipt) -> Self {
        Self {
            booking_id: receipt.booking_id,
            status: NoShowStatus::Charged,
            reason: None,
            payment_id: Some(receipt.payment_id),
            fee_cents: Some(receipt.fee_cents),
            currency: Some(receipt.currency),
            note_updated: Some(receipt.note_updated),
        }
    }

    fn skipped(booking_id: &str, reason: &SkipReason) -> Self {
        Self::without_payment(booking_id, NoShowStatus::Skipped, reason.describe())
    }

    fn failed(booking_id: &str, err: &BookingError) -> Self {
        Self::without_payment(booking_id, NoShowStatus::Failed, err.to_string())
    }

    fn without_payment(booking_id: &str, status: NoShowStatus, reason: String) -> Self {
        Self {
            booking_id: booking_id.to_string(),
            status,
            reason: Some(reason),
            payment_id: None,
            fee_cents: None,
            currency: None,
            note_updated: None,
        }
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoShowRunReport {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub processed: usize,
    pub charged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub results: Vec<NoShowResult>,
}

enum Attempt {
    Charged(ChargeReceipt),
    Skipped(SkipReason),
}

struct PaymentSource {
    card_id: String,
    customer_id: Option<String>,
    amount_cents: i64,
    currency: String,
}

pub struct NoShowCollector {
    square: Arc<dyn SquareApi>,
    records: Arc<dyn PaymentRecordStore>,
    settings: NoShowSettings,
    run_lock: Mutex<()>,
}

impl NoShowCollector {
    pub fn new(
        square: Arc<dyn SquareApi>,
        records: Arc<dyn PaymentRecordStore>,
        settings: NoShowSettings,
    ) -> Self {
        Self {
            square,
            records,
            settings,
            run_lock: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &NoShowSettings {
        &self.settings
    }

    /// Charges every accepted booking that started between `lookback` and
    /// `min_age` before `now`. Overlapping runs are rejected.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<NoShowRunReport, BookingError> {
        let _run = self.run_lock.try_lock().map_err(|_| BookingError::RunInProgress)?;

        let window_start = now - self.settings.lookback;
        let window_end = now - self.settings.min_age;
        info!(
            "[NoShow] Scanning bookings between {} and {}",
            window_start, window_end
        );

        let bookings = fetch_bookings(self.square.as_ref(), window_start, window_end).await?;
        let accepted: Vec<Booking> = bookings
            .into_iter()
            .filter(|b| b.status() == BookingStatus::Accepted)
            .collect();

        let mut report = NoShowRunReport {
            window_start,
            window_end,
            processed: accepted.len(),
            charged: 0,
            skipped: 0,
            failed: 0,
            results: Vec::with_capacity(accepted.len()),
        };

        for booking in &accepted {
            let row = match self.attempt(booking).await {
                Ok(Attempt::Charged(receipt)) => {
                    report.charged += 1;
                    NoShowResult::charged(receipt)
                }
                Ok(Attempt::Skipped(reason)) => {
                    debug!("[NoShow] Skipping booking {}: {}", booking.id, reason.describe());
                    report.skipped += 1;
                    NoShowResult::skipped(&booking.id, &reason)
                }
                Err(e) => {
                    error!("[NoShow] Failed to charge booking {}: {}", booking.id, e);
                    report.failed += 1;
                    NoShowResult::failed(&booking.id, &e)
                }
            };
            report.results.push(row);
        }

        info!(
            "[NoShow] Run finished: {} processed, {} charged, {} skipped, {} failed",
            report.processed, report.charged, report.skipped, report.failed
        );
        Ok(report)
    }

    /// Charges one booking regardless of when it started.
    pub async fn charge_booking(&self, booking_id: &str) -> Result<ChargeReceipt, BookingError> {
        let booking = self.square.retrieve_booking(booking_id).await.map_err(|e| {
            if e.is_not_found() {
                BookingError::NotFound(booking_id.to_string())
            } else {
                BookingError::Square(e)
            }
        })?;

        match booking.status() {
            BookingStatus::Accepted | BookingStatus::NoShow => {}
            other => {
                return Err(BookingError::InvalidState(format!(
                    "Booking {} has status {:?}; only accepted or no-show bookings can be charged",
                    booking_id, other
                )))
            }
        }

        match self.attempt(&booking).await? {
            Attempt::Charged(receipt) => Ok(receipt),
            Attempt::Skipped(reason) => Err(reason.into_error(booking_id)),
        }
    }

    async fn attempt(&self, booking: &Booking) -> Result<Attempt, BookingError> {
        let note = booking.seller_note.as_deref().unwrap_or_default();
        let record = self.records.get(&booking.id).unwrap_or_default();

        if let Some(payment_id) = record.charged_payment_id.clone() {
            return Ok(Attempt::Skipped(SkipReason::AlreadyCharged(payment_id)));
        }
        if seller_note::is_charged(note) {
            let payment_id = seller_note::charged_payment_id(note).unwrap_or_default();
            return Ok(Attempt::Skipped(SkipReason::AlreadyCharged(payment_id)));
        }

        let source = match self.payment_source(booking, record).await {
            Ok(source) => source,
            Err(reason) => return Ok(Attempt::Skipped(reason)),
        };
        let fee_cents = no_show_fee(source.amount_cents, self.settings.fee_percent);
        if fee_cents <= 0 {
            return Ok(Attempt::Skipped(SkipReason::ZeroFee));
        }

        match self.records.try_claim(&booking.id, booking.version) {
            ClaimOutcome::Claimed => {}
            ClaimOutcome::AlreadyCharged(payment_id) => {
                return Ok(Attempt::Skipped(SkipReason::AlreadyCharged(payment_id)))
            }
            ClaimOutcome::HeldElsewhere => return Ok(Attempt::Skipped(SkipReason::ClaimedElsewhere)),
            ClaimOutcome::Stale { claimed_version } => {
                warn!(
                    "[NoShow] Booking {} read at version {:?}, already claimed at {}",
                    booking.id, booking.version, claimed_version
                );
                return Ok(Attempt::Skipped(SkipReason::StaleVersion));
            }
        }

        let payment = self
            .square
            .create_payment(CreatePaymentRequest {
                source_id: source.card_id,
                idempotency_key: Uuid::new_v4().to_string(),
                amount_money: Money {
                    amount: fee_cents,
                    currency: source.currency.clone(),
                },
                customer_id: source.customer_id,
                location_id: booking.location_id.clone(),
                reference_id: Some(booking.id.clone()),
                verification_token: None,
                note: Some(format!("No-show fee for booking {}", booking.id)),
                autocomplete: Some(true),
            })
            .await;
        let payment = match payment {
            Ok(payment) => payment,
            Err(e) => {
                self.records.release(&booking.id);
                return Err(e.into());
            }
        };

        self.records.commit(&booking.id, &payment.id);
        info!(
            "[NoShow] Charged {} {} for booking {} (payment {})",
            fee_cents, source.currency, booking.id, payment.id
        );

        let marked = seller_note::with_charge_marker(
            booking.seller_note.as_deref(),
            &payment.id,
            fee_cents,
            &source.currency,
        );
        let note_updated = match self
            .square
            .update_booking(
                &booking.id,
                Booking {
                    version: booking.version,
                    seller_note: Some(marked),
                    ..Default::default()
                },
            )
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    "[NoShow] Payment {} recorded but seller note of booking {} not updated: {}",
                    payment.id, booking.id, e
                );
                false
            }
        };

        Ok(Attempt::Charged(ChargeReceipt {
            booking_id: booking.id.clone(),
            payment_id: payment.id,
            fee_cents,
            currency: source.currency,
            note_updated,
        }))
    }

    /// Card, customer and amount to charge. The record store wins over the
    /// seller note; the catalog price of the booked service fills a missing amount.
    async fn payment_source(
        &self,
        booking: &Booking,
        record: PaymentRecord,
    ) -> Result<PaymentSource, SkipReason> {
        let legacy = seller_note::parse_payment_details(booking.seller_note.as_deref().unwrap_or_default());

        let card_id = match record.card_id.or(legacy.card_id) {
            Some(card_id) => card_id,
            None => return Err(SkipReason::NoPaymentDetails),
        };
        let mut currency = record.currency.or(legacy.currency);
        let mut amount_cents = record.amount_cents.or(legacy.amount_cents);

        if amount_cents.is_none() {
            if let Some(money) = self.catalog_price(booking).await {
                currency = currency.or(Some(money.currency));
                amount_cents = Some(money.amount);
            }
        }
        let amount_cents = match amount_cents {
            Some(amount) => amount,
            None => return Err(SkipReason::NoAmount),
        };

        Ok(PaymentSource {
            card_id,
            customer_id: record.customer_id.or_else(|| booking.customer_id.clone()),
            amount_cents,
            currency: currency.unwrap_or_else(|| DEFAULT_FEE_CURRENCY.to_string()),
        })
    }

    async fn catalog_price(&self, booking: &Booking) -> Option<Money> {
        let variation_id = booking.first_segment()?.service_variation_id.as_deref()?;
        match self.square.retrieve_catalog_object(variation_id).await {
            Ok(object) => object.item_variation_data?.price_money,
            Err(e) => {
                warn!(
                    "[NoShow] Could not look up price of {} for booking {}: {}",
                    variation_id, booking.id, e
                );
                None
            }
        }
    }
}
