use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn message_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(controller::send_message))
        .route("/unread-count", get(controller::unread_count))
        .route("/conversation/{user_id}", get(controller::conversation))
        .route("/booking/{booking_id}", get(controller::booking_thread))
        .route("/{id}/read", post(controller::mark_read))
}
