use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct Car {
    pub id: String,
    pub owner_id: String,
    pub model: String,
    pub year: i32,
    pub mileage: f64,
    pub daily_price: Decimal,
    pub location: String,
    pub availability_start: NaiveDate,
    pub availability_end: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Car {
    /// A requested range must sit entirely inside the advertised
    /// availability window.
    pub fn window_contains(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start >= self.availability_start && end <= self.availability_end
    }
}

/// Listing details before persistence. Presets fill in the vehicle
/// fields; location and availability always come from the owner.
#[derive(Debug, Clone)]
pub struct CarSpec {
    pub model: String,
    pub year: i32,
    pub mileage: f64,
    pub daily_price: Decimal,
    pub location: String,
    pub availability_start: NaiveDate,
    pub availability_end: NaiveDate,
}

impl CarSpec {
    pub fn economy(location: String, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            model: "Economy".to_string(),
            year: 2015,
            mileage: 80_000.0,
            daily_price: Decimal::new(3500, 2),
            location,
            availability_start: start,
            availability_end: end,
        }
    }

    pub fn luxury(location: String, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            model: "Luxury".to_string(),
            year: 2020,
            mileage: 30_000.0,
            daily_price: Decimal::new(9000, 2),
            location,
            availability_start: start,
            availability_end: end,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn custom(
        model: String,
        year: i32,
        mileage: f64,
        daily_price: Decimal,
        location: String,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            model,
            year,
            mileage,
            daily_price,
            location,
            availability_start: start,
            availability_end: end,
        }
    }
}
