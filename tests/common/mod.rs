use std::sync::Arc;

use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderValue;
use axum_test::TestServer;
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::{MySql, Pool};

use driveshare::services::gateway::{GatewayError, PaymentGateway, SimulatedGateway};
use driveshare::services::jwt::JwtService;
use driveshare::services::notify::{InAppChannel, Notifier};

// Allow dead_code for utilities used by other test files
#[allow(dead_code)]
pub struct TestContext {
    pub server: TestServer,
    pub db: Pool<MySql>,
}

#[allow(dead_code)]
impl TestContext {
    /// None when no test database is configured; callers skip the test.
    pub async fn try_new() -> Option<Self> {
        Self::try_new_with_gateway(Arc::new(SimulatedGateway)).await
    }

    pub async fn try_new_with_gateway(gateway: Arc<dyn PaymentGateway>) -> Option<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("TEST_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .ok()?;

        let db = sqlx::mysql::MySqlPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .expect("Failed to run migrations");

        let jwt_secret = std::env::var("JWT_SECRET")
            .unwrap_or_else(|_| "test-secret-key-for-testing-only".to_string());
        let jwt_service = JwtService::new(jwt_secret);

        let notifier = Notifier::new().register(Box::new(InAppChannel));

        let app = driveshare::create_app(db.clone(), jwt_service, notifier, gateway).await;
        let server = TestServer::new(app).expect("Failed to create test server");

        Some(Self { server, db })
    }

    pub async fn cleanup(&self) {
        // Child tables first, FKs point upwards
        for table in [
            "messages",
            "payments",
            "payment_methods",
            "bookings",
            "cars",
            "password_resets",
            "users",
        ] {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&self.db)
                .await
                .ok();
        }
    }
}

/// Gateway that always declines, for exercising the failure path.
#[allow(dead_code)]
pub struct DecliningGateway;

#[async_trait]
impl PaymentGateway for DecliningGateway {
    async fn transfer(
        &self,
        _from_user_id: &str,
        _to_user_id: &str,
        _amount: Decimal,
    ) -> Result<(), GatewayError> {
        Err(GatewayError::Declined("insufficient funds".to_string()))
    }
}

// Helper to generate unique test email
#[allow(dead_code)]
pub fn test_email() -> String {
    format!("test_{}@example.com", uuid::Uuid::new_v4())
}

#[allow(dead_code)]
pub fn test_password() -> &'static str {
    "TestPassword123!"
}

#[allow(dead_code)]
pub fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

/// Register a user with standard security answers; returns
/// (access_token, user_id).
#[allow(dead_code)]
pub async fn register_user(server: &TestServer, email: &str) -> (String, String) {
    let response = server
        .post("/auth/register")
        .json(&json!({
            "email": email,
            "password": test_password(),
            "password_confirm": test_password(),
            "name": "Test User",
            "security_questions": [
                {"question": "First pet?", "answer": "Fluffy"},
                {"question": "Birth city?", "answer": "Detroit"},
                {"question": "Favorite teacher?", "answer": "Smith"}
            ]
        }))
        .await;

    let body: serde_json::Value = response.json();
    (
        body["access_token"].as_str().expect("no access token").to_string(),
        body["user"]["id"].as_str().expect("no user id").to_string(),
    )
}

/// Create a custom listing owned by the token's user; returns the car id.
#[allow(dead_code)]
pub async fn create_car(
    server: &TestServer,
    token: &str,
    daily_price: &str,
    availability_start: &str,
    availability_end: &str,
) -> String {
    let response = server
        .post("/cars")
        .add_header(AUTHORIZATION, bearer(token))
        .json(&json!({
            "model": "Toyota Corolla",
            "year": 2021,
            "mileage": 25000.0,
            "daily_price": daily_price,
            "location": "Detroit",
            "availability_start": availability_start,
            "availability_end": availability_end
        }))
        .await;

    let body: serde_json::Value = response.json();
    body["id"].as_str().expect("no car id").to_string()
}

/// Book a car as the token's user; returns the booking id.
#[allow(dead_code)]
pub async fn create_booking(
    server: &TestServer,
    token: &str,
    car_id: &str,
    start_date: &str,
    end_date: &str,
) -> String {
    let response = server
        .post("/bookings")
        .add_header(AUTHORIZATION, bearer(token))
        .json(&json!({
            "car_id": car_id,
            "start_date": start_date,
            "end_date": end_date
        }))
        .await;

    let body: serde_json::Value = response.json();
    body["id"].as_str().expect("no booking id").to_string()
}
