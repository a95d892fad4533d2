use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn booking_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            post(controller::create_booking).get(controller::list_bookings),
        )
        .route("/{id}", get(controller::get_booking))
        .route("/{id}/status", post(controller::update_status))
}
