use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;

use crate::common::{
    bearer, create_booking, create_car, register_user, test_email, DecliningGateway, TestContext,
};

struct Setup {
    ctx: TestContext,
    owner_token: String,
    renter_token: String,
    booking_id: String,
}

async fn setup_with(ctx: TestContext) -> Setup {
    let (owner_token, _) = register_user(&ctx.server, &test_email()).await;
    let (renter_token, _) = register_user(&ctx.server, &test_email()).await;
    let car_id = create_car(&ctx.server, &owner_token, "45.00", "2024-01-01", "2024-03-31").await;
    let booking_id =
        create_booking(&ctx.server, &renter_token, &car_id, "2024-01-10", "2024-01-12").await;

    Setup {
        ctx,
        owner_token,
        renter_token,
        booking_id,
    }
}

async fn pay(s: &Setup) -> serde_json::Value {
    s.ctx
        .server
        .post("/payments")
        .add_header(AUTHORIZATION, bearer(&s.renter_token))
        .json(&json!({"booking_id": s.booking_id}))
        .await
        .json()
}

async fn refund(s: &Setup, token: &str, payment_id: &str) -> (StatusCode, serde_json::Value) {
    let response = s
        .ctx
        .server
        .post(&format!("/payments/{payment_id}/refund"))
        .add_header(AUTHORIZATION, bearer(token))
        .await;

    let status = response.status_code();
    (status, response.json())
}

async fn booking_status(s: &Setup) -> String {
    let response = s
        .ctx
        .server
        .get(&format!("/bookings/{}", s.booking_id))
        .add_header(AUTHORIZATION, bearer(&s.renter_token))
        .await;
    let body: serde_json::Value = response.json();
    body["status"].as_str().unwrap().to_string()
}

#[tokio::test]
#[serial]
async fn refunding_a_completed_payment_cancels_the_booking() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let s = setup_with(ctx).await;

    let payment = pay(&s).await;
    let payment_id = payment["id"].as_str().unwrap();

    let (status, refunded) = refund(&s, &s.owner_token, payment_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refunded["status"], "refunded");
    assert_eq!(booking_status(&s).await, "cancelled");

    s.ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn only_the_owner_can_refund() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let s = setup_with(ctx).await;

    let payment = pay(&s).await;
    let payment_id = payment["id"].as_str().unwrap();

    let (status, _) = refund(&s, &s.renter_token, payment_id).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    s.ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn a_failed_payment_cannot_be_refunded() {
    let Some(ctx) = TestContext::try_new_with_gateway(Arc::new(DecliningGateway)).await else {
        return;
    };
    let s = setup_with(ctx).await;

    // The decline leaves a failed payment row behind.
    s.ctx
        .server
        .post("/payments")
        .add_header(AUTHORIZATION, bearer(&s.renter_token))
        .json(&json!({"booking_id": s.booking_id}))
        .await
        .assert_status(StatusCode::BAD_GATEWAY);

    let failed: (String,) = sqlx::query_as("SELECT id FROM payments WHERE booking_id = ?")
        .bind(s.booking_id.as_str())
        .fetch_one(&s.ctx.db)
        .await
        .unwrap();

    let (status, _) = refund(&s, &s.owner_token, &failed.0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The booking keeps its status.
    assert_eq!(booking_status(&s).await, "pending");

    s.ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn a_refunded_payment_cannot_be_refunded_again() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let s = setup_with(ctx).await;

    let payment = pay(&s).await;
    let payment_id = payment["id"].as_str().unwrap();

    let (status, _) = refund(&s, &s.owner_token, payment_id).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = refund(&s, &s.owner_token, payment_id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    s.ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn refunding_an_unknown_payment_returns_not_found() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let s = setup_with(ctx).await;

    let (status, _) = refund(&s, &s.owner_token, "missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    s.ctx.cleanup().await;
}
