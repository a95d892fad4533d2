use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

use super::schema::BookingStatus;

#[derive(Debug, Clone, FromRow)]
pub struct Booking {
    pub id: String,
    pub car_id: String,
    pub renter_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking joined with the car columns the listing and detail views
/// need for display and pricing.
#[derive(Debug, Clone, FromRow)]
pub struct BookingWithCar {
    #[sqlx(flatten)]
    pub booking: Booking,
    pub car_model: String,
    pub daily_price: Decimal,
    pub owner_id: String,
}
