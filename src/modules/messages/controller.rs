use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::crud::{MessageCrud, MessageError};
use super::schema::{ErrorResponse, MessageResponse, SendMessageRequest, UnreadCountResponse};
use crate::modules::auth::AuthUser;
use crate::services::notify::{self, NotificationEvent, NotificationKind};
use crate::AppState;

type ErrorReply = (StatusCode, Json<ErrorResponse>);

fn reply(e: MessageError) -> ErrorReply {
    (e.status_code(), Json(ErrorResponse::new(e.to_string())))
}

pub async fn send_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ErrorReply> {
    let crud = MessageCrud::new(state.db.clone());

    let message = crud
        .send(
            &user.id,
            &req.receiver_id,
            req.booking_id.as_deref(),
            &req.content,
        )
        .await
        .map_err(reply)?;

    let event = NotificationEvent::new(NotificationKind::Message)
        .message("You have received a new message on DriveShare.");

    match notify::recipient_for(&state.db, &message.receiver_id).await {
        Ok(Some(recipient)) => state.notifier.notify(&event, &[recipient]).await,
        Ok(None) => {}
        Err(e) => tracing::warn!(
            "Failed to load notification recipient {}: {}",
            message.receiver_id,
            e
        ),
    }

    Ok((StatusCode::CREATED, Json(message.into())))
}

pub async fn conversation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(other_id): Path<String>,
) -> Result<Json<Vec<MessageResponse>>, ErrorReply> {
    let crud = MessageCrud::new(state.db.clone());

    let messages = crud.conversation(&user.id, &other_id).await.map_err(reply)?;

    Ok(Json(messages.into_iter().map(|m| m.into()).collect()))
}

pub async fn booking_thread(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<String>,
) -> Result<Json<Vec<MessageResponse>>, ErrorReply> {
    let crud = MessageCrud::new(state.db.clone());

    let messages = crud
        .booking_thread(&booking_id, &user.id)
        .await
        .map_err(reply)?;

    Ok(Json(messages.into_iter().map(|m| m.into()).collect()))
}

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(message_id): Path<String>,
) -> Result<Json<MessageResponse>, ErrorReply> {
    let crud = MessageCrud::new(state.db.clone());

    let message = crud.mark_read(&message_id, &user.id).await.map_err(reply)?;

    Ok(Json(message.into()))
}

pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<UnreadCountResponse>, ErrorReply> {
    let crud = MessageCrud::new(state.db.clone());

    let unread = crud.unread_count(&user.id).await.map_err(reply)?;

    Ok(Json(UnreadCountResponse { unread }))
}
