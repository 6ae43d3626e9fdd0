#[cfg(test)]
mod tests {
    use crate::availability::{calculate_availability, AvailabilitySettings, DateRange};
    use chrono::{Duration, TimeZone, Utc};
    use detailing_square::models::{AppointmentSegment, Booking, BookingStatus};
    use proptest::prelude::*;

    // Bookings at 15:00 UTC (late morning in New York) on days of May 2025.
    fn bookings_from(specs: &[(u32, i64)]) -> Vec<Booking> {
        specs
            .iter()
            .enumerate()
            .map(|(i, (day, minutes))| Booking {
                id: format!("b{}", i),
                status: Some(BookingStatus::Accepted),
                start_at: Some(Utc.with_ymd_and_hms(2025, 5, *day, 15, 0, 0).unwrap()),
                appointment_segments: vec![AppointmentSegment {
                    duration_minutes: Some(*minutes),
                    ..Default::default()
                }],
                ..Default::default()
            })
            .collect()
    }

    proptest! {
        #[test]
        fn test_remaining_never_negative_and_bounded(
            specs in prop::collection::vec((1u32..=31, 15i64..600), 0..40),
            required in 0i64..600,
        ) {
            let range = DateRange::for_month(2025, 5, None).unwrap();
            let settings = AvailabilitySettings::default();
            let days = calculate_availability(&range, &bookings_from(&specs), required, &settings);

            for day in &days {
                prop_assert!(day.remaining_hours >= 0.0);
                prop_assert!(day.remaining_hours <= day.total_hours);
                prop_assert_eq!(day.total_hours, 9.0);
                if day.booked_hours >= 9.0 {
                    prop_assert_eq!(day.remaining_hours, 0.0);
                    prop_assert!(!day.available);
                }
                if day.booked_hours == 0.0 {
                    prop_assert_eq!(day.remaining_hours, day.total_hours);
                    prop_assert_eq!(day.available, required <= 540);
                }
            }
        }

        #[test]
        fn test_booked_minutes_are_conserved_on_working_days(
            specs in prop::collection::vec((1u32..=31, 15i64..600), 0..40),
        ) {
            let range = DateRange::for_month(2025, 5, None).unwrap();
            let settings = AvailabilitySettings::default();
            let bookings = bookings_from(&specs);
            let days = calculate_availability(&range, &bookings, 0, &settings);

            let weekday_minutes: i64 = specs
                .iter()
                .filter(|(day, _)| {
                    use chrono::Datelike;
                    let date = chrono::NaiveDate::from_ymd_opt(2025, 5, *day).unwrap();
                    settings.working_days.contains(&date.weekday())
                })
                .map(|(_, minutes)| minutes)
                .sum();
            let reported: f64 = days.iter().map(|d| d.booked_hours).sum();
            prop_assert!((reported * 60.0 - weekday_minutes as f64).abs() < 1e-6);
        }

        #[test]
        fn test_cancelled_bookings_never_reduce_capacity(
            day in 1u32..=31,
            minutes in 15i64..600,
            hour_offset in 0i64..8,
        ) {
            let range = DateRange::for_month(2025, 5, None).unwrap();
            let settings = AvailabilitySettings::default();
            let mut bookings = bookings_from(&[(day, minutes)]);
            bookings[0].status = Some(BookingStatus::CancelledBySeller);
            bookings[0].start_at = bookings[0].start_at.map(|s| s + Duration::hours(hour_offset));

            let days = calculate_availability(&range, &bookings, 0, &settings);
            prop_assert!(days.iter().all(|d| d.booked_hours == 0.0 && d.available));
        }
    }
}
