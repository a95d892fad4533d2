pub mod config;
pub mod modules;
pub mod services;

use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use config::DbPool;
use modules::auth::auth_routes;
use modules::bookings::booking_routes;
use modules::cars::car_routes;
use modules::messages::message_routes;
use modules::payments::payment_routes;
use services::gateway::PaymentGateway;
use services::jwt::JwtService;
use services::notify::Notifier;
use services::security::security_headers;

pub struct AppState {
    pub db: DbPool,
    pub jwt_service: JwtService,
    pub notifier: Notifier,
    pub gateway: Arc<dyn PaymentGateway>,
}

pub async fn create_app(
    db: DbPool,
    jwt_service: JwtService,
    notifier: Notifier,
    gateway: Arc<dyn PaymentGateway>,
) -> Router {
    let state = Arc::new(AppState {
        db,
        jwt_service,
        notifier,
        gateway,
    });

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/auth", auth_routes())
        .nest("/cars", car_routes())
        .nest("/bookings", booking_routes())
        .nest("/payments", payment_routes())
        .nest("/messages", message_routes())
        .layer(middleware::from_fn(security_headers))
        .layer(RequestBodyLimitLayer::new(1024 * 100)) // 100KB max body
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "DriveShare API"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
