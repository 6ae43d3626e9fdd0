#[cfg(test)]
mod tests {
    use crate::availability::{
        booked_minutes_by_day, calculate_availability, fetch_bookings, AvailabilitySettings,
        DateRange,
    };
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use detailing_config::BusinessConfig;
    use detailing_square::mock::MockSquare;
    use detailing_square::models::{AppointmentSegment, Booking, BookingStatus};

    fn booking(id: &str, start: DateTime<Utc>, minutes: Option<i64>, status: BookingStatus) -> Booking {
        Booking {
            id: id.to_string(),
            status: Some(status),
            start_at: Some(start),
            appointment_segments: vec![AppointmentSegment {
                duration_minutes: minutes,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_range_and_weekends_omitted() {
        // May 2025: 31 days, 22 weekdays.
        let range = DateRange::for_month(2025, 5, None).unwrap();
        assert_eq!(range.first, date(2025, 5, 1));
        assert_eq!(range.last, date(2025, 5, 31));

        let days = calculate_availability(&range, &[], 0, &AvailabilitySettings::default());
        assert_eq!(days.len(), 22);
        assert!(days.iter().all(|d| d.available && d.remaining_hours == d.total_hours));
        assert!(days.iter().all(|d| d.total_hours == 9.0));
        assert!(!days.iter().any(|d| d.date == date(2025, 5, 3)), "Saturday is omitted");
    }

    #[test]
    fn test_february_leap_year() {
        let range = DateRange::for_month(2024, 2, None).unwrap();
        assert_eq!(range.last, date(2024, 2, 29));
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(DateRange::for_month(2025, 13, None).is_err());
        assert!(DateRange::for_month(2025, 0, None).is_err());
        assert!(DateRange::for_month(2025, 2, Some(30)).is_err());
        assert!(DateRange::for_month(1800, 2, None).is_err());
    }

    #[test]
    fn test_single_day() {
        let range = DateRange::for_month(2025, 5, Some(5)).unwrap();
        let bookings = vec![booking(
            "b1",
            Utc.with_ymd_and_hms(2025, 5, 5, 14, 0, 0).unwrap(),
            Some(120),
            BookingStatus::Accepted,
        )];
        let days = calculate_availability(&range, &bookings, 240, &AvailabilitySettings::default());
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].booked_hours, 2.0);
        assert_eq!(days[0].remaining_hours, 7.0);
        assert!(days[0].available);
    }

    #[test]
    fn test_overbooked_day_clamps_to_zero() {
        let range = DateRange::for_month(2025, 5, Some(6)).unwrap();
        let start = Utc.with_ymd_and_hms(2025, 5, 6, 13, 0, 0).unwrap();
        let bookings = vec![
            booking("a", start, Some(300), BookingStatus::Accepted),
            booking("b", start, Some(300), BookingStatus::Pending),
        ];
        let days = calculate_availability(&range, &bookings, 0, &AvailabilitySettings::default());
        assert_eq!(days[0].remaining_hours, 0.0);
        assert!(!days[0].available);
        assert_eq!(days[0].booked_hours, 10.0);
    }

    #[test]
    fn test_missing_duration_counts_as_default() {
        let start = Utc.with_ymd_and_hms(2025, 5, 7, 13, 0, 0).unwrap();
        let mut no_segment = booking("a", start, None, BookingStatus::Accepted);
        no_segment.appointment_segments.clear();
        let bookings = vec![
            no_segment,
            booking("b", start, None, BookingStatus::Accepted),
        ];
        let per_day = booked_minutes_by_day(&bookings, &AvailabilitySettings::default());
        assert_eq!(per_day[&date(2025, 5, 7)], 480);
    }

    #[test]
    fn test_cancelled_and_declined_are_ignored() {
        let start = Utc.with_ymd_and_hms(2025, 5, 7, 13, 0, 0).unwrap();
        let bookings = vec![
            booking("a", start, Some(240), BookingStatus::CancelledByCustomer),
            booking("b", start, Some(240), BookingStatus::CancelledBySeller),
            booking("c", start, Some(240), BookingStatus::Declined),
            booking("d", start, Some(60), BookingStatus::NoShow),
        ];
        let per_day = booked_minutes_by_day(&bookings, &AvailabilitySettings::default());
        assert_eq!(per_day[&date(2025, 5, 7)], 60);
    }

    #[test]
    fn test_required_duration_must_fit() {
        let range = DateRange::for_month(2025, 5, Some(8)).unwrap();
        let start = Utc.with_ymd_and_hms(2025, 5, 8, 13, 0, 0).unwrap();
        let bookings = vec![booking("a", start, Some(360), BookingStatus::Accepted)];
        let settings = AvailabilitySettings::default();

        // Three hours left.
        assert!(calculate_availability(&range, &bookings, 180, &settings)[0].available);
        assert!(!calculate_availability(&range, &bookings, 240, &settings)[0].available);
        assert!(calculate_availability(&range, &bookings, 0, &settings)[0].available);
    }

    #[test]
    fn test_days_are_bucketed_in_business_time_zone() {
        // 02:00 UTC on Tuesday is still Monday evening in New York.
        let late_monday = Utc.with_ymd_and_hms(2025, 5, 6, 2, 0, 0).unwrap();
        let bookings = vec![booking("a", late_monday, Some(60), BookingStatus::Accepted)];
        let per_day = booked_minutes_by_day(&bookings, &AvailabilitySettings::default());
        assert_eq!(per_day.get(&date(2025, 5, 5)), Some(&60));
        assert_eq!(per_day.get(&date(2025, 5, 6)), None);
    }

    #[test]
    fn test_utc_bounds_follow_dst() {
        let tz = chrono_tz::America::New_York;
        let (start, end) = DateRange::for_month(2025, 3, None).unwrap().utc_bounds(tz);
        // EST at the start of March, EDT after the switch.
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 1, 5, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 4, 1, 4, 0, 0).unwrap());
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = BusinessConfig::default();
        config.time_zone = "Africa/Tunis".to_string();
        config.working_days = vec!["Mon".to_string(), "Sat".to_string()];
        let settings = AvailabilitySettings::from_config(&config).unwrap();
        assert_eq!(settings.time_zone, chrono_tz::Africa::Tunis);
        assert_eq!(settings.daily_minutes, 540);
        assert_eq!(settings.working_days.len(), 2);

        config.time_zone = "Mars/Olympus".to_string();
        assert!(AvailabilitySettings::from_config(&config).is_err());
    }

    #[tokio::test]
    async fn test_fetch_splits_long_windows_and_dedupes() {
        let start = Utc.with_ymd_and_hms(2025, 9, 30, 22, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 10, 31, 23, 0, 0).unwrap();
        let inside = Utc.with_ymd_and_hms(2025, 10, 10, 12, 0, 0).unwrap();

        let mut mock = MockSquare::new();
        mock.expect_list_bookings()
            .times(2)
            .returning(move |query| {
                let window = query.start_at_max.unwrap() - query.start_at_min.unwrap();
                assert!(window <= chrono::Duration::days(31));
                Ok(vec![Booking {
                    id: "same".to_string(),
                    start_at: Some(inside),
                    ..Default::default()
                }])
            });

        let bookings = fetch_bookings(&mock, start, end).await.unwrap();
        assert_eq!(bookings.len(), 1);
    }
}
