mod fixtures;

use axum::http::{header, Request, StatusCode};
use axum::body::Body;
use detailing_booking::records::PaymentRecordStore;
use detailing_square::mock::MockSquare;
use detailing_square::models::{
    Booking, BookingStatus, CatalogItemVariation, CatalogObject, Money, Payment, TeamMember,
};
use detailing_square::SquareError;
use fixtures::{body_json, booking, request, TestApp, CRON_SECRET};
use serde_json::json;
use tower::ServiceExt;

fn catalog_variation(id: &str) -> CatalogObject {
    CatalogObject {
        object_type: "ITEM_VARIATION".to_string(),
        id: id.to_string(),
        version: Some(7),
        item_variation_data: Some(CatalogItemVariation {
            name: "Small Car".to_string(),
            price_money: Some(Money {
                amount: 6000,
                currency: "USD".to_string(),
            }),
            service_duration: Some(2 * 3_600_000),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_create_booking_fills_defaults_and_stores_payment_record() {
    let mut mock = MockSquare::new();
    mock.expect_retrieve_catalog_object()
        .returning(|id| Ok(catalog_variation(id)));
    mock.expect_list_team_members().returning(|| {
        Ok(vec![TeamMember {
            id: "tm-1".to_string(),
            ..Default::default()
        }])
    });
    mock.expect_create_booking()
        .withf(|b: &Booking, key: &String| {
            let segment = &b.appointment_segments[0];
            !key.is_empty()
                && b.customer_id.as_deref() == Some("cust-1")
                && segment.team_member_id.as_deref() == Some("tm-1")
                && segment.duration_minutes == Some(120)
                && segment.service_variation_version == Some(7)
                && b.seller_note.as_deref().map_or(false, |n| {
                    n.contains("Card ID: ccof:1") && n.contains("Service Amount (cents): 6000")
                })
        })
        .times(1)
        .returning(|mut b, _| {
            b.id = "new-1".to_string();
            b.status = Some(BookingStatus::Accepted);
            Ok(b)
        });

    let app = TestApp::new(mock);
    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/square/bookings",
            None,
            Some(json!({
                "startAt": "2025-06-02T14:00:00Z",
                "serviceVariationId": "var-int-s",
                "customerId": "cust-1",
                "cardId": "ccof:1"
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["booking"]["id"], "new-1");
    let record = app.records.get("new-1").unwrap();
    assert_eq!(record.card_id.as_deref(), Some("ccof:1"));
    assert_eq!(record.amount_cents, Some(6000));
    assert_eq!(record.currency.as_deref(), Some("USD"));
}

#[tokio::test]
async fn test_create_booking_requires_fields() {
    let mut mock = MockSquare::new();
    mock.expect_create_booking().times(0);
    let response = TestApp::new(mock)
        .router
        .oneshot(request(
            "POST",
            "/square/bookings",
            None,
            Some(json!({ "startAt": "2025-06-02T14:00:00Z", "serviceVariationId": "v" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"]
        .as_str()
        .unwrap()
        .contains("customerId"));
}

#[tokio::test]
async fn test_create_booking_rejects_non_positive_amount() {
    for amount in [-500, 0] {
        let mut mock = MockSquare::new();
        mock.expect_retrieve_catalog_object().times(0);
        mock.expect_create_booking().times(0);
        let app = TestApp::new(mock);
        let response = app
            .router
            .clone()
            .oneshot(request(
                "POST",
                "/square/bookings",
                None,
                Some(json!({
                    "startAt": "2025-06-02T14:00:00Z",
                    "serviceVariationId": "var-int-s",
                    "customerId": "cust-1",
                    "cardId": "ccof:1",
                    "amountCents": amount
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", amount);
        assert!(body_json(response).await["error"]
            .as_str()
            .unwrap()
            .contains("amountCents"));
        assert!(app.records.get("new-1").is_none());
    }
}

#[tokio::test]
async fn test_admin_routes_require_session() {
    let mut mock = MockSquare::new();
    mock.expect_list_bookings().returning(|_| Ok(vec![]));
    let app = TestApp::new(mock);

    let response = app
        .router
        .clone()
        .oneshot(request("GET", "/square/bookings", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let cookie = app.admin_cookie();
    let response = app
        .router
        .clone()
        .oneshot(request(
            "GET",
            "/square/bookings?startAtMin=2025-06-01T00:00:00Z&startAtMax=2025-06-30T00:00:00Z",
            Some(&cookie),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["bookings"], json!([]));

    let response = app
        .router
        .oneshot(request(
            "GET",
            "/square/bookings?startAtMin=2025-06-30T00:00:00Z&startAtMax=2025-06-01T00:00:00Z",
            Some(&cookie),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_accept_sends_version() {
    let mut mock = MockSquare::new();
    mock.expect_retrieve_booking()
        .returning(|id| Ok(booking(id, BookingStatus::Pending)));
    mock.expect_update_booking()
        .withf(|id: &str, update: &Booking| {
            id == "b1" && update.version == Some(1) && update.status == Some(BookingStatus::Accepted)
        })
        .times(1)
        .returning(|id, update| {
            let mut b = booking(id, BookingStatus::Accepted);
            b.version = update.version.map(|v| v + 1);
            Ok(b)
        });
    let app = TestApp::new(mock);
    let cookie = app.admin_cookie();

    let response = app
        .router
        .oneshot(request(
            "PATCH",
            "/square/bookings/b1",
            Some(&cookie),
            Some(json!({ "action": "accept" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["booking"]["status"], "ACCEPTED");
    assert_eq!(body["booking"]["version"], 2);
}

#[tokio::test]
async fn test_note_action_keeps_payment_lines() {
    let mut mock = MockSquare::new();
    mock.expect_retrieve_booking().returning(|id| {
        let mut b = booking(id, BookingStatus::Accepted);
        b.seller_note = Some("old text\nCard ID: ccof:9".to_string());
        Ok(b)
    });
    mock.expect_update_booking()
        .withf(|_: &str, update: &Booking| {
            update.seller_note.as_deref() == Some("Bring ladder\nCard ID: ccof:9")
        })
        .times(1)
        .returning(|id, _| Ok(booking(id, BookingStatus::Accepted)));
    let app = TestApp::new(mock);
    let cookie = app.admin_cookie();

    let response = app
        .router
        .oneshot(request(
            "PATCH",
            "/square/bookings/b1",
            Some(&cookie),
            Some(json!({ "action": "note", "sellerNote": "Bring ladder" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_action_is_rejected() {
    let mut mock = MockSquare::new();
    mock.expect_retrieve_booking().times(0);
    let app = TestApp::new(mock);
    let cookie = app.admin_cookie();

    let response = app
        .router
        .oneshot(request(
            "PATCH",
            "/square/bookings/b1",
            Some(&cookie),
            Some(json!({ "action": "archive" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_cancelled_booking_is_invalid_state() {
    let mut mock = MockSquare::new();
    mock.expect_retrieve_booking()
        .returning(|id| Ok(booking(id, BookingStatus::CancelledByCustomer)));
    mock.expect_cancel_booking().times(0);

    let response = TestApp::new(mock)
        .router
        .oneshot(request("DELETE", "/bookings/b1", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["errors"][0]["code"],
        "INVALID_BOOKING_STATE"
    );
}

#[tokio::test]
async fn test_delete_cancels_with_version() {
    let mut mock = MockSquare::new();
    mock.expect_retrieve_booking()
        .returning(|id| Ok(booking(id, BookingStatus::Accepted)));
    mock.expect_cancel_booking()
        .withf(|id: &str, version: &Option<i64>| id == "b1" && *version == Some(1))
        .times(1)
        .returning(|id, _| Ok(booking(id, BookingStatus::CancelledBySeller)));

    let response = TestApp::new(mock)
        .router
        .oneshot(request("DELETE", "/bookings/b1", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["booking"]["status"], "CANCELLED_BY_SELLER");
}

#[tokio::test]
async fn test_delete_missing_booking_is_404() {
    let mut mock = MockSquare::new();
    mock.expect_retrieve_booking()
        .returning(|_| Err(SquareError::api(404, vec![])));

    let response = TestApp::new(mock)
        .router
        .oneshot(request("DELETE", "/bookings/nope", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_charge_no_show_twice_is_conflict() {
    let mut mock = MockSquare::new();
    mock.expect_retrieve_booking().returning(|id| {
        let mut b = booking(id, BookingStatus::NoShow);
        b.seller_note = Some("Card ID: ccof:1\nService Amount (cents): 10000".to_string());
        Ok(b)
    });
    mock.expect_create_payment().times(1).returning(|_| {
        Ok(Payment {
            id: "pay-1".to_string(),
            ..Default::default()
        })
    });
    mock.expect_update_booking().returning(|_, b| Ok(b));
    let app = TestApp::new(mock);

    let unauthenticated = app
        .router
        .clone()
        .oneshot(request("POST", "/bookings/b1/charge-no-show", None, None))
        .await
        .unwrap();
    assert_eq!(unauthenticated.status(), StatusCode::UNAUTHORIZED);

    let cookie = app.admin_cookie();
    let first = app
        .router
        .clone()
        .oneshot(request("POST", "/bookings/b1/charge-no-show", Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let body = body_json(first).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["paymentId"], "pay-1");
    assert_eq!(body["feeCents"], 3000);

    let second = app
        .router
        .oneshot(request("POST", "/bookings/b1/charge-no-show", Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cron_accepts_secret_or_admin_session() {
    let mut mock = MockSquare::new();
    mock.expect_list_bookings().returning(|_| Ok(vec![]));
    let app = TestApp::new(mock);

    let response = app
        .router
        .clone()
        .oneshot(request("GET", "/cron/no-show-check", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/cron/no-show-check")
                .header(header::AUTHORIZATION, format!("Bearer {}", CRON_SECRET))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["processed"], 0);
    assert_eq!(report["results"], json!([]));

    let cookie = app.admin_cookie();
    let response = app
        .router
        .oneshot(request("GET", "/cron/no-show-check", Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
