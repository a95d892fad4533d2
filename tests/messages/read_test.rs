use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;

use crate::common::{bearer, register_user, test_email, TestContext};

async fn send(
    ctx: &TestContext,
    token: &str,
    receiver_id: &str,
    content: &str,
) -> serde_json::Value {
    ctx.server
        .post("/messages")
        .add_header(AUTHORIZATION, bearer(token))
        .json(&json!({
            "receiver_id": receiver_id,
            "booking_id": null,
            "content": content
        }))
        .await
        .json()
}

async fn unread(ctx: &TestContext, token: &str) -> i64 {
    let response = ctx
        .server
        .get("/messages/unread-count")
        .add_header(AUTHORIZATION, bearer(token))
        .await;
    let body: serde_json::Value = response.json();
    body["unread"].as_i64().unwrap()
}

#[tokio::test]
#[serial]
async fn only_the_receiver_can_mark_a_message_read() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (alice_token, _) = register_user(&ctx.server, &test_email()).await;
    let (bob_token, bob_id) = register_user(&ctx.server, &test_email()).await;

    let message = send(&ctx, &alice_token, &bob_id, "Ping").await;
    let message_id = message["id"].as_str().unwrap();

    // The sender does not get to flip the flag.
    let response = ctx
        .server
        .post(&format!("/messages/{message_id}/read"))
        .add_header(AUTHORIZATION, bearer(&alice_token))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = ctx
        .server
        .post(&format!("/messages/{message_id}/read"))
        .add_header(AUTHORIZATION, bearer(&bob_token))
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["is_read"], true);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn unread_count_tracks_the_read_flag() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (alice_token, _) = register_user(&ctx.server, &test_email()).await;
    let (bob_token, bob_id) = register_user(&ctx.server, &test_email()).await;

    assert_eq!(unread(&ctx, &bob_token).await, 0);

    let first = send(&ctx, &alice_token, &bob_id, "One").await;
    send(&ctx, &alice_token, &bob_id, "Two").await;
    assert_eq!(unread(&ctx, &bob_token).await, 2);

    // Reading one message leaves the other pending; the sender's own
    // count is untouched.
    ctx.server
        .post(&format!("/messages/{}/read", first["id"].as_str().unwrap()))
        .add_header(AUTHORIZATION, bearer(&bob_token))
        .await
        .assert_status(StatusCode::OK);

    assert_eq!(unread(&ctx, &bob_token).await, 1);
    assert_eq!(unread(&ctx, &alice_token).await, 0);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn marking_an_unknown_message_returns_not_found() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (token, _) = register_user(&ctx.server, &test_email()).await;

    let response = ctx
        .server
        .post("/messages/missing/read")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    ctx.cleanup().await;
}
