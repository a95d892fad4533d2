use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// CREATE / UPDATE
// =============================================================================

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CarPreset {
    Economy,
    Luxury,
}

/// With a preset, only location and the availability window are read
/// from the rest of the request; without one, all vehicle fields are
/// required.
#[derive(Debug, Deserialize)]
pub struct CreateCarRequest {
    pub preset: Option<CarPreset>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub mileage: Option<f64>,
    pub daily_price: Option<Decimal>,
    pub location: String,
    pub availability_start: NaiveDate,
    pub availability_end: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCarRequest {
    pub model: Option<String>,
    pub year: Option<i32>,
    pub mileage: Option<f64>,
    pub daily_price: Option<Decimal>,
    pub location: Option<String>,
    pub availability_start: Option<NaiveDate>,
    pub availability_end: Option<NaiveDate>,
}

// =============================================================================
// RESPONSES
// =============================================================================

#[derive(Debug, Serialize)]
pub struct CarResponse {
    pub id: String,
    pub owner_id: String,
    pub model: String,
    pub year: i32,
    pub mileage: f64,
    pub daily_price: Decimal,
    pub location: String,
    pub availability_start: NaiveDate,
    pub availability_end: NaiveDate,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<crate::modules::cars::model::Car> for CarResponse {
    fn from(c: crate::modules::cars::model::Car) -> Self {
        Self {
            id: c.id,
            owner_id: c.owner_id,
            model: c.model,
            year: c.year,
            mileage: c.mileage,
            daily_price: c.daily_price,
            location: c.location,
            availability_start: c.availability_start,
            availability_end: c.availability_end,
            created_at: c.created_at,
        }
    }
}

// =============================================================================
// SEARCH / AVAILABILITY
// =============================================================================

#[derive(Debug, Deserialize, Default, Clone)]
pub struct SearchQuery {
    pub location: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub available: bool,
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}
