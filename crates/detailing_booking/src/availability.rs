// --- File: crates/detailing_booking/src/availability.rs ---

//! Per-day capacity for the booking calendar.
//!
//! Every working day has a fixed number of bookable minutes. Each booking that
//! still occupies the calendar consumes the duration of its first appointment
//! segment on the business-local day it starts. What is left decides whether a
//! service of a given length still fits that day.

use crate::error::BookingError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use detailing_config::BusinessConfig;
use detailing_square::models::{Booking, BookingListQuery};
use detailing_square::{SquareApi, SquareError};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Square rejects `ListBookings` windows longer than this.
const MAX_LIST_WINDOW_DAYS: i64 = 31;

/// Business calendar used by the calculator.
#[derive(Debug, Clone)]
pub struct AvailabilitySettings {
    pub time_zone: Tz,
    pub daily_minutes: i64,
    pub working_days: Vec<Weekday>,
    /// Assumed length of a booking whose first segment has no duration.
    pub default_duration_minutes: i64,
}

impl AvailabilitySettings {
    pub fn from_config(config: &BusinessConfig) -> Result<Self, BookingError> {
        let time_zone: Tz = config.time_zone.parse().map_err(|e| {
            BookingError::Config(format!("invalid business time zone '{}': {}", config.time_zone, e))
        })?;
        let working_days = config
            .working_days
            .iter()
            .map(|d| {
                d.parse::<Weekday>()
                    .map_err(|_| BookingError::Config(format!("invalid working day '{}'", d)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            time_zone,
            daily_minutes: i64::from(config.daily_hours) * 60,
            working_days,
            default_duration_minutes: config.default_duration_minutes,
        })
    }
}

impl Default for AvailabilitySettings {
    fn default() -> Self {
        Self {
            time_zone: chrono_tz::America::New_York,
            daily_minutes: 9 * 60,
            working_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            default_duration_minutes: 240,
        }
    }
}

/// Inclusive range of business-local calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl DateRange {
    /// The whole month, or just `day` of it.
    pub fn for_month(year: i32, month: u32, day: Option<u32>) -> Result<Self, BookingError> {
        if !(1..=12).contains(&month) {
            return Err(BookingError::InvalidRequest(format!(
                "month must be between 1 and 12, got {}",
                month
            )));
        }
        if !(2000..=2100).contains(&year) {
            return Err(BookingError::InvalidRequest(format!(
                "year {} is out of range",
                year
            )));
        }
        let first_of_month = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| BookingError::InvalidRequest(format!("invalid month {}-{}", year, month)))?;

        if let Some(day) = day {
            let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
                BookingError::InvalidRequest(format!("invalid day {}-{:02}-{:02}", year, month, day))
            })?;
            return Ok(Self {
                first: date,
                last: date,
            });
        }

        let last = first_of_month
            .checked_add_months(chrono::Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(|| BookingError::InvalidRequest(format!("invalid month {}-{}", year, month)))?;
        Ok(Self {
            first: first_of_month,
            last,
        })
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.first.iter_days().take_while(move |d| *d <= self.last)
    }

    /// UTC instants bounding the range: local midnight of the first day up to
    /// local midnight after the last day.
    pub fn utc_bounds(&self, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
        let after_last = self.last.succ_opt().unwrap_or(self.last);
        (local_midnight(self.first, tz), local_midnight(after_last, tz))
    }
}

fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        // Midnight skipped by a DST jump: the day starts an hour later.
        None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive)),
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityDay {
    pub date: NaiveDate,
    pub total_hours: f64,
    pub booked_hours: f64,
    pub remaining_hours: f64,
    pub available: bool,
}

/// Minutes booked per business-local day.
///
/// Declined and cancelled bookings are ignored, as are bookings without a start.
pub fn booked_minutes_by_day(
    bookings: &[Booking],
    settings: &AvailabilitySettings,
) -> BTreeMap<NaiveDate, i64> {
    let mut per_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for booking in bookings {
        if !booking.status().occupies_calendar() {
            continue;
        }
        let start = match booking.start_at {
            Some(start) => start,
            None => continue,
        };
        let minutes = booking
            .first_segment()
            .and_then(|s| s.duration_minutes)
            .filter(|m| *m > 0)
            .unwrap_or(settings.default_duration_minutes);
        let day = start.with_timezone(&settings.time_zone).date_naive();
        *per_day.entry(day).or_insert(0) += minutes;
    }
    per_day
}

/// Availability for every working day in `range`. Non-working days are omitted.
///
/// A day is available when time is left and at least `required_minutes` of it.
pub fn calculate_availability(
    range: &DateRange,
    bookings: &[Booking],
    required_minutes: i64,
    settings: &AvailabilitySettings,
) -> Vec<AvailabilityDay> {
    let booked = booked_minutes_by_day(bookings, settings);
    let total_hours = minutes_to_hours(settings.daily_minutes);

    range
        .days()
        .filter(|day| settings.working_days.contains(&day.weekday()))
        .map(|date| {
            let booked_minutes = booked.get(&date).copied().unwrap_or(0);
            let remaining = (settings.daily_minutes - booked_minutes).max(0);
            AvailabilityDay {
                date,
                total_hours,
                booked_hours: minutes_to_hours(booked_minutes),
                remaining_hours: minutes_to_hours(remaining),
                available: remaining > 0 && remaining >= required_minutes.max(0),
            }
        })
        .collect()
}

/// Bookings starting in `[start, end)`, fetched in windows Square accepts.
pub async fn fetch_bookings(
    square: &dyn SquareApi,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<Booking>, SquareError> {
    let mut seen = HashSet::new();
    let mut bookings = Vec::new();
    let mut window_start = start;
    while window_start < end {
        let window_end = (window_start + Duration::days(MAX_LIST_WINDOW_DAYS)).min(end);
        let page = square
            .list_bookings(BookingListQuery {
                start_at_min: Some(window_start),
                start_at_max: Some(window_end),
                ..Default::default()
            })
            .await?;
        for booking in page {
            let in_window = booking.start_at.map_or(true, |s| s >= start && s < end);
            if in_window && seen.insert(booking.id.clone()) {
                bookings.push(booking);
            }
        }
        window_start = window_end;
    }
    Ok(bookings)
}

fn minutes_to_hours(minutes: i64) -> f64 {
    minutes as f64 / 60.0
}
