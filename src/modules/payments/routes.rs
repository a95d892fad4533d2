use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn payment_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(controller::process_payment))
        .route("/history", get(controller::payment_history))
        .route("/booking/{booking_id}", get(controller::booking_payment))
        .route("/{id}/refund", post(controller::refund_payment))
        .route(
            "/methods",
            post(controller::create_method).get(controller::list_methods),
        )
        .route("/methods/{id}", axum::routing::delete(controller::delete_method))
        .route("/methods/{id}/default", post(controller::set_default_method))
}
