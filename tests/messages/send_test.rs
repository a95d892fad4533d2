use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;

use crate::common::{
    bearer, create_booking, create_car, register_user, test_email, TestContext,
};

async fn send(
    ctx: &TestContext,
    token: &str,
    receiver_id: &str,
    booking_id: Option<&str>,
    content: &str,
) -> (StatusCode, serde_json::Value) {
    let response = ctx
        .server
        .post("/messages")
        .add_header(AUTHORIZATION, bearer(token))
        .json(&json!({
            "receiver_id": receiver_id,
            "booking_id": booking_id,
            "content": content
        }))
        .await;

    let status = response.status_code();
    (status, response.json())
}

#[tokio::test]
#[serial]
async fn messages_land_in_both_directions_of_a_conversation() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (alice_token, alice_id) = register_user(&ctx.server, &test_email()).await;
    let (bob_token, bob_id) = register_user(&ctx.server, &test_email()).await;

    let (status, sent) = send(&ctx, &alice_token, &bob_id, None, "Is the car available?").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sent["is_read"], false);

    send(&ctx, &bob_token, &alice_id, None, "Yes, it is.").await;

    // Both participants see the same thread, oldest first.
    for (token, other) in [(&alice_token, &bob_id), (&bob_token, &alice_id)] {
        let response = ctx
            .server
            .get(&format!("/messages/conversation/{other}"))
            .add_header(AUTHORIZATION, bearer(token))
            .await;
        response.assert_status(StatusCode::OK);
        let thread: serde_json::Value = response.json();
        let thread = thread.as_array().unwrap();
        assert_eq!(thread.len(), 2);
        assert_eq!(thread[0]["content"], "Is the car available?");
        assert_eq!(thread[1]["content"], "Yes, it is.");
    }

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn empty_messages_are_rejected() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (token, _) = register_user(&ctx.server, &test_email()).await;
    let (_, other_id) = register_user(&ctx.server, &test_email()).await;

    let (status, _) = send(&ctx, &token, &other_id, None, "   ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn unknown_receivers_are_rejected() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (token, _) = register_user(&ctx.server, &test_email()).await;

    let (status, _) = send(&ctx, &token, "missing", None, "Hello?").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn booking_messages_stay_between_the_parties() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (owner_token, owner_id) = register_user(&ctx.server, &test_email()).await;
    let (renter_token, renter_id) = register_user(&ctx.server, &test_email()).await;
    let (stranger_token, stranger_id) = register_user(&ctx.server, &test_email()).await;
    let car_id = create_car(&ctx.server, &owner_token, "45.00", "2024-01-01", "2024-03-31").await;
    let booking_id =
        create_booking(&ctx.server, &renter_token, &car_id, "2024-01-10", "2024-01-12").await;

    // Renter to owner inside the booking works.
    let (status, _) = send(
        &ctx,
        &renter_token,
        &owner_id,
        Some(&booking_id),
        "Where do I pick it up?",
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Strangers cannot write into the thread, nor be written to.
    let (status, _) = send(&ctx, &stranger_token, &owner_id, Some(&booking_id), "Hi").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&ctx, &renter_token, &stranger_id, Some(&booking_id), "Hi").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A booking message to oneself makes no sense either.
    let (status, _) = send(&ctx, &renter_token, &renter_id, Some(&booking_id), "Hi").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn booking_thread_is_readable_by_parties_only() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (owner_token, owner_id) = register_user(&ctx.server, &test_email()).await;
    let (renter_token, _) = register_user(&ctx.server, &test_email()).await;
    let (stranger_token, _) = register_user(&ctx.server, &test_email()).await;
    let car_id = create_car(&ctx.server, &owner_token, "45.00", "2024-01-01", "2024-03-31").await;
    let booking_id =
        create_booking(&ctx.server, &renter_token, &car_id, "2024-01-10", "2024-01-12").await;

    send(
        &ctx,
        &renter_token,
        &owner_id,
        Some(&booking_id),
        "Where do I pick it up?",
    )
    .await;

    let response = ctx
        .server
        .get(&format!("/messages/booking/{booking_id}"))
        .add_header(AUTHORIZATION, bearer(&owner_token))
        .await;
    response.assert_status(StatusCode::OK);
    let thread: serde_json::Value = response.json();
    assert_eq!(thread.as_array().unwrap().len(), 1);

    let response = ctx
        .server
        .get(&format!("/messages/booking/{booking_id}"))
        .add_header(AUTHORIZATION, bearer(&stranger_token))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = ctx
        .server
        .get("/messages/booking/missing")
        .add_header(AUTHORIZATION, bearer(&owner_token))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn messages_to_unknown_bookings_are_rejected() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (token, _) = register_user(&ctx.server, &test_email()).await;
    let (_, other_id) = register_user(&ctx.server, &test_email()).await;

    let (status, _) = send(&ctx, &token, &other_id, Some("missing"), "Hello").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await;
}
