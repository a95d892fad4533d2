use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(controller::register))
        .route("/login", post(controller::login))
        .route("/me", get(controller::me))
        .route("/forgot-password", post(controller::forgot_password))
        .route("/security-answers", post(controller::security_answers))
        .route("/reset-password", post(controller::reset_password))
}
