use chrono::{NaiveDate, Utc};
use sqlx::{MySql, Pool};
use uuid::Uuid;

use super::model::{Car, CarSpec};
use super::schema::{SearchQuery, UpdateCarRequest};

#[derive(Debug, thiserror::Error)]
pub enum CarError {
    #[error("Car not found")]
    CarNotFound,

    #[error("You do not own this car")]
    NotOwner,

    #[error("Car has active bookings and cannot be deleted")]
    HasActiveBookings,

    #[error("Availability start must not be after availability end")]
    InvalidWindow,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CarError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::CarNotFound => StatusCode::NOT_FOUND,
            Self::NotOwner => StatusCode::FORBIDDEN,
            Self::HasActiveBookings => StatusCode::CONFLICT,
            Self::InvalidWindow => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct CarCrud {
    pool: Pool<MySql>,
}

impl CarCrud {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, owner_id: &str, spec: CarSpec) -> Result<Car, CarError> {
        if spec.availability_start > spec.availability_end {
            return Err(CarError::InvalidWindow);
        }

        let now = Utc::now();
        let car = Car {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            model: spec.model,
            year: spec.year,
            mileage: spec.mileage,
            daily_price: spec.daily_price,
            location: spec.location,
            availability_start: spec.availability_start,
            availability_end: spec.availability_end,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO cars (
                id, owner_id, model, year, mileage, daily_price, location,
                availability_start, availability_end, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&car.id)
        .bind(&car.owner_id)
        .bind(&car.model)
        .bind(car.year)
        .bind(car.mileage)
        .bind(car.daily_price)
        .bind(&car.location)
        .bind(car.availability_start)
        .bind(car.availability_end)
        .bind(car.created_at)
        .bind(car.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(car)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Car>, CarError> {
        let car = sqlx::query_as::<_, Car>("SELECT * FROM cars WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(car)
    }

    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Car>, CarError> {
        let cars = sqlx::query_as::<_, Car>(
            "SELECT * FROM cars WHERE owner_id = ? ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(cars)
    }

    pub async fn update(
        &self,
        car_id: &str,
        owner_id: &str,
        req: &UpdateCarRequest,
    ) -> Result<Car, CarError> {
        let mut car = self
            .find_by_id(car_id)
            .await?
            .ok_or(CarError::CarNotFound)?;

        if car.owner_id != owner_id {
            return Err(CarError::NotOwner);
        }

        if let Some(ref model) = req.model {
            car.model = model.clone();
        }
        if let Some(year) = req.year {
            car.year = year;
        }
        if let Some(mileage) = req.mileage {
            car.mileage = mileage;
        }
        if let Some(daily_price) = req.daily_price {
            car.daily_price = daily_price;
        }
        if let Some(ref location) = req.location {
            car.location = location.clone();
        }
        if let Some(start) = req.availability_start {
            car.availability_start = start;
        }
        if let Some(end) = req.availability_end {
            car.availability_end = end;
        }

        if car.availability_start > car.availability_end {
            return Err(CarError::InvalidWindow);
        }

        sqlx::query(
            r#"
            UPDATE cars
            SET model = ?, year = ?, mileage = ?, daily_price = ?, location = ?,
                availability_start = ?, availability_end = ?
            WHERE id = ?
            "#,
        )
        .bind(&car.model)
        .bind(car.year)
        .bind(car.mileage)
        .bind(car.daily_price)
        .bind(&car.location)
        .bind(car.availability_start)
        .bind(car.availability_end)
        .bind(&car.id)
        .execute(&self.pool)
        .await?;

        Ok(car)
    }

    /// Deletion is blocked while any pending or confirmed booking
    /// exists; settled history goes with the car.
    pub async fn delete(&self, car_id: &str, owner_id: &str) -> Result<(), CarError> {
        let car = self
            .find_by_id(car_id)
            .await?
            .ok_or(CarError::CarNotFound)?;

        if car.owner_id != owner_id {
            return Err(CarError::NotOwner);
        }

        let active: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM bookings WHERE car_id = ? AND status IN ('pending', 'confirmed')",
        )
        .bind(car_id)
        .fetch_one(&self.pool)
        .await?;

        if active.0 > 0 {
            return Err(CarError::HasActiveBookings);
        }

        sqlx::query("DELETE FROM cars WHERE id = ?")
            .bind(car_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Search listings by location substring and, when a range is
    /// given, keep only cars whose window contains it and that have no
    /// conflicting active booking.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Car>, CarError> {
        let cars = match (query.start_date, query.end_date) {
            (Some(start), Some(end)) => {
                sqlx::query_as::<_, Car>(
                    r#"
                    SELECT * FROM cars
                    WHERE (? IS NULL OR location LIKE CONCAT('%', ?, '%'))
                      AND availability_start <= ?
                      AND availability_end >= ?
                      AND id NOT IN (
                          SELECT car_id FROM bookings
                          WHERE status IN ('pending', 'confirmed')
                            AND start_date <= ?
                            AND end_date >= ?
                      )
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(&query.location)
                .bind(&query.location)
                .bind(start)
                .bind(end)
                .bind(end)
                .bind(start)
                .fetch_all(&self.pool)
                .await?
            }
            _ => {
                sqlx::query_as::<_, Car>(
                    r#"
                    SELECT * FROM cars
                    WHERE (? IS NULL OR location LIKE CONCAT('%', ?, '%'))
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(&query.location)
                .bind(&query.location)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(cars)
    }
}
