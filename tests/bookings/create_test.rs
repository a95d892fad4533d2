use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;

use crate::common::{bearer, create_car, register_user, test_email, TestContext};

#[tokio::test]
#[serial]
async fn booking_starts_pending_with_quoted_total() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (owner_token, _) = register_user(&ctx.server, &test_email()).await;
    let (renter_token, renter_id) = register_user(&ctx.server, &test_email()).await;
    let car_id = create_car(&ctx.server, &owner_token, "45.00", "2024-01-01", "2024-03-31").await;

    let response = ctx
        .server
        .post("/bookings")
        .add_header(AUTHORIZATION, bearer(&renter_token))
        .json(&json!({
            "car_id": car_id,
            "start_date": "2024-01-10",
            "end_date": "2024-01-12"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "pending");
    assert_eq!(body["renter_id"], renter_id);
    assert_eq!(body["total_price"], "135.00"); // 45 * 3 inclusive days
    assert_eq!(body["car_model"], "Toyota Corolla");

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn overlapping_booking_is_rejected_with_conflict() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (owner_token, _) = register_user(&ctx.server, &test_email()).await;
    let (renter_token, _) = register_user(&ctx.server, &test_email()).await;
    let (second_renter, _) = register_user(&ctx.server, &test_email()).await;
    let car_id = create_car(&ctx.server, &owner_token, "45.00", "2024-01-01", "2024-03-31").await;

    crate::common::create_booking(&ctx.server, &renter_token, &car_id, "2024-01-10", "2024-01-12")
        .await;

    // Overlap at the edge (inclusive bounds)
    let response = ctx
        .server
        .post("/bookings")
        .add_header(AUTHORIZATION, bearer(&second_renter))
        .json(&json!({
            "car_id": car_id,
            "start_date": "2024-01-12",
            "end_date": "2024-01-20"
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    // Fully containing the existing range
    let response = ctx
        .server
        .post("/bookings")
        .add_header(AUTHORIZATION, bearer(&second_renter))
        .json(&json!({
            "car_id": car_id,
            "start_date": "2024-01-05",
            "end_date": "2024-01-20"
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    // Disjoint range is fine
    let response = ctx
        .server
        .post("/bookings")
        .add_header(AUTHORIZATION, bearer(&second_renter))
        .json(&json!({
            "car_id": car_id,
            "start_date": "2024-01-13",
            "end_date": "2024-01-20"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn booking_outside_availability_window_is_rejected() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (owner_token, _) = register_user(&ctx.server, &test_email()).await;
    let (renter_token, _) = register_user(&ctx.server, &test_email()).await;
    let car_id = create_car(&ctx.server, &owner_token, "45.00", "2024-01-01", "2024-03-31").await;

    let response = ctx
        .server
        .post("/bookings")
        .add_header(AUTHORIZATION, bearer(&renter_token))
        .json(&json!({
            "car_id": car_id,
            "start_date": "2024-03-25",
            "end_date": "2024-04-05"
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn owners_cannot_book_their_own_car() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (owner_token, _) = register_user(&ctx.server, &test_email()).await;
    let car_id = create_car(&ctx.server, &owner_token, "45.00", "2024-01-01", "2024-03-31").await;

    let response = ctx
        .server
        .post("/bookings")
        .add_header(AUTHORIZATION, bearer(&owner_token))
        .json(&json!({
            "car_id": car_id,
            "start_date": "2024-01-10",
            "end_date": "2024-01-12"
        }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn inverted_date_range_is_rejected() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (owner_token, _) = register_user(&ctx.server, &test_email()).await;
    let (renter_token, _) = register_user(&ctx.server, &test_email()).await;
    let car_id = create_car(&ctx.server, &owner_token, "45.00", "2024-01-01", "2024-03-31").await;

    let response = ctx
        .server
        .post("/bookings")
        .add_header(AUTHORIZATION, bearer(&renter_token))
        .json(&json!({
            "car_id": car_id,
            "start_date": "2024-01-12",
            "end_date": "2024-01-10"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn booking_unknown_car_returns_not_found() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (renter_token, _) = register_user(&ctx.server, &test_email()).await;

    let response = ctx
        .server
        .post("/bookings")
        .add_header(AUTHORIZATION, bearer(&renter_token))
        .json(&json!({
            "car_id": "missing",
            "start_date": "2024-01-10",
            "end_date": "2024-01-12"
        }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn listing_splits_rented_and_received() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (owner_token, _) = register_user(&ctx.server, &test_email()).await;
    let (renter_token, _) = register_user(&ctx.server, &test_email()).await;
    let car_id = create_car(&ctx.server, &owner_token, "45.00", "2024-01-01", "2024-03-31").await;

    let booking_id =
        crate::common::create_booking(&ctx.server, &renter_token, &car_id, "2024-01-10", "2024-01-12")
            .await;

    let response = ctx
        .server
        .get("/bookings")
        .add_header(AUTHORIZATION, bearer(&renter_token))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["my_bookings"][0]["id"], booking_id);
    assert!(body["received_bookings"].as_array().unwrap().is_empty());

    let response = ctx
        .server
        .get("/bookings")
        .add_header(AUTHORIZATION, bearer(&owner_token))
        .await;
    let body: serde_json::Value = response.json();
    assert!(body["my_bookings"].as_array().unwrap().is_empty());
    assert_eq!(body["received_bookings"][0]["id"], booking_id);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn third_parties_cannot_view_a_booking() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (owner_token, _) = register_user(&ctx.server, &test_email()).await;
    let (renter_token, _) = register_user(&ctx.server, &test_email()).await;
    let (stranger_token, _) = register_user(&ctx.server, &test_email()).await;
    let car_id = create_car(&ctx.server, &owner_token, "45.00", "2024-01-01", "2024-03-31").await;

    let booking_id =
        crate::common::create_booking(&ctx.server, &renter_token, &car_id, "2024-01-10", "2024-01-12")
            .await;

    let response = ctx
        .server
        .get(&format!("/bookings/{booking_id}"))
        .add_header(AUTHORIZATION, bearer(&stranger_token))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = ctx
        .server
        .get(&format!("/bookings/{booking_id}"))
        .add_header(AUTHORIZATION, bearer(&owner_token))
        .await;
    response.assert_status(StatusCode::OK);

    ctx.cleanup().await;
}
