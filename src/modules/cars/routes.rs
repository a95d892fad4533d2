use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn car_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(controller::create_car).get(controller::search_cars))
        .route("/mine", get(controller::my_cars))
        .route(
            "/{id}",
            get(controller::get_car)
                .put(controller::update_car)
                .delete(controller::delete_car),
        )
        .route("/{id}/availability", get(controller::check_availability))
}
