use std::sync::Arc;

use driveshare::config::{environment::Config, init_db};
use driveshare::services::gateway::SimulatedGateway;
use driveshare::services::jwt::JwtService;
use driveshare::services::notify::{EmailChannel, InAppChannel, Notifier};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "driveshare=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load environment configuration");

    let db = init_db().await;
    tracing::info!("Connected to MySQL");

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Failed to run migrations");

    let jwt_service = JwtService::new(config.jwt_secret);

    let mut notifier = Notifier::new().register(Box::new(InAppChannel));
    match config.smtp {
        Some(smtp) => {
            notifier = notifier.register(Box::new(EmailChannel::new(smtp)));
            tracing::info!("Email notifications enabled");
        }
        None => {
            tracing::info!("SMTP not configured, email notifications disabled");
        }
    }

    let app = driveshare::create_app(db, jwt_service, notifier, Arc::new(SimulatedGateway)).await;

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    tracing::info!("Server running on http://localhost:3000");
    axum::serve(listener, app).await.unwrap();
}
