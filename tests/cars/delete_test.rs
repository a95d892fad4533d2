use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;

use crate::common::{bearer, create_booking, create_car, register_user, test_email, TestContext};

#[tokio::test]
#[serial]
async fn delete_with_active_booking_is_blocked() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (owner_token, _) = register_user(&ctx.server, &test_email()).await;
    let (renter_token, _) = register_user(&ctx.server, &test_email()).await;

    let car_id = create_car(&ctx.server, &owner_token, "45.00", "2024-01-01", "2024-03-31").await;
    create_booking(&ctx.server, &renter_token, &car_id, "2024-01-10", "2024-01-12").await;

    let response = ctx
        .server
        .delete(&format!("/cars/{car_id}"))
        .add_header(AUTHORIZATION, bearer(&owner_token))
        .await;

    response.assert_status(StatusCode::CONFLICT);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn delete_after_cancellation_succeeds() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (owner_token, _) = register_user(&ctx.server, &test_email()).await;
    let (renter_token, _) = register_user(&ctx.server, &test_email()).await;

    let car_id = create_car(&ctx.server, &owner_token, "45.00", "2024-01-01", "2024-03-31").await;
    let booking_id =
        create_booking(&ctx.server, &renter_token, &car_id, "2024-01-10", "2024-01-12").await;

    ctx.server
        .post(&format!("/bookings/{booking_id}/status"))
        .add_header(AUTHORIZATION, bearer(&renter_token))
        .json(&json!({"status": "cancelled"}))
        .await;

    let response = ctx
        .server
        .delete(&format!("/cars/{car_id}"))
        .add_header(AUTHORIZATION, bearer(&owner_token))
        .await;

    response.assert_status(StatusCode::NO_CONTENT);

    let response = ctx.server.get(&format!("/cars/{car_id}")).await;
    response.assert_status(StatusCode::NOT_FOUND);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn only_the_owner_can_delete() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (owner_token, _) = register_user(&ctx.server, &test_email()).await;
    let (other_token, _) = register_user(&ctx.server, &test_email()).await;

    let car_id = create_car(&ctx.server, &owner_token, "45.00", "2024-01-01", "2024-03-31").await;

    let response = ctx
        .server
        .delete(&format!("/cars/{car_id}"))
        .add_header(AUTHORIZATION, bearer(&other_token))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);

    ctx.cleanup().await;
}
