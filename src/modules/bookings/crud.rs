use chrono::{NaiveDate, Utc};
use sqlx::{MySql, Pool};
use uuid::Uuid;

use super::model::{Booking, BookingWithCar};
use super::schema::{transition_allowed, ActorRole, BookingStatus};
use crate::modules::cars::model::Car;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Car not found")]
    CarNotFound,

    #[error("Booking not found")]
    BookingNotFound,

    #[error("You cannot book your own car")]
    OwnBookingCar,

    #[error("You are not a party to this booking")]
    Unauthorized,

    #[error("Start date cannot be after end date")]
    InvalidDateRange,

    #[error("The car is not available for the selected dates")]
    Conflict,

    #[error("Invalid status change from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl BookingError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::CarNotFound | Self::BookingNotFound => StatusCode::NOT_FOUND,
            Self::OwnBookingCar | Self::Unauthorized => StatusCode::FORBIDDEN,
            Self::InvalidDateRange | Self::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Outcome of a status change, with everything the notification
/// fan-out needs.
pub struct TransitionResult {
    pub booking: BookingWithCar,
    pub role: ActorRole,
    pub from: BookingStatus,
}

pub struct BookingCrud {
    pool: Pool<MySql>,
}

const SELECT_WITH_CAR: &str = r#"
    SELECT b.id, b.car_id, b.renter_id, b.start_date, b.end_date, b.status,
           b.created_at, b.updated_at,
           c.model AS car_model, c.daily_price, c.owner_id
    FROM bookings b
    JOIN cars c ON c.id = b.car_id
"#;

impl BookingCrud {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// Availability contract: fails closed outside the car's window,
    /// otherwise no active booking may overlap the requested range
    /// under inclusive bounds. Pure read, no side effects.
    pub async fn is_available(
        &self,
        car: &Car,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<bool, BookingError> {
        if !car.window_contains(start, end) {
            return Ok(false);
        }

        let conflicts = self.count_conflicts(&self.pool, &car.id, start, end).await?;

        Ok(conflicts == 0)
    }

    async fn count_conflicts<'e, E>(
        &self,
        executor: E,
        car_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64, BookingError>
    where
        E: sqlx::Executor<'e, Database = MySql>,
    {
        // Overlap under inclusive bounds: existing.start <= end AND existing.end >= start
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM bookings
            WHERE car_id = ?
              AND status IN ('pending', 'confirmed')
              AND start_date <= ?
              AND end_date >= ?
            "#,
        )
        .bind(car_id)
        .bind(end)
        .bind(start)
        .fetch_one(executor)
        .await?;

        Ok(result.0)
    }

    /// Create a booking in `pending`. The availability check and the
    /// insert run in one transaction that first locks the car row, so
    /// two concurrent requests for the same car serialize instead of
    /// both passing the check.
    pub async fn create(
        &self,
        car_id: &str,
        renter_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(Booking, Car), BookingError> {
        if start > end {
            return Err(BookingError::InvalidDateRange);
        }

        let mut tx = self.pool.begin().await?;

        let car = sqlx::query_as::<_, Car>("SELECT * FROM cars WHERE id = ? FOR UPDATE")
            .bind(car_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(BookingError::CarNotFound)?;

        if car.owner_id == renter_id {
            return Err(BookingError::OwnBookingCar);
        }

        if !car.window_contains(start, end) {
            return Err(BookingError::Conflict);
        }

        let conflicts = self.count_conflicts(&mut *tx, car_id, start, end).await?;
        if conflicts > 0 {
            return Err(BookingError::Conflict);
        }

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            car_id: car_id.to_string(),
            renter_id: renter_id.to_string(),
            start_date: start,
            end_date: end,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO bookings (id, car_id, renter_id, start_date, end_date, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&booking.id)
        .bind(&booking.car_id)
        .bind(&booking.renter_id)
        .bind(booking.start_date)
        .bind(booking.end_date)
        .bind(booking.status)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((booking, car))
    }

    pub async fn find_with_car(&self, booking_id: &str) -> Result<Option<BookingWithCar>, BookingError> {
        let sql = format!("{SELECT_WITH_CAR} WHERE b.id = ?");

        let booking = sqlx::query_as::<_, BookingWithCar>(&sql)
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    pub async fn list_as_renter(&self, renter_id: &str) -> Result<Vec<BookingWithCar>, BookingError> {
        let sql = format!("{SELECT_WITH_CAR} WHERE b.renter_id = ? ORDER BY b.created_at DESC");

        let bookings = sqlx::query_as::<_, BookingWithCar>(&sql)
            .bind(renter_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(bookings)
    }

    pub async fn list_received(&self, owner_id: &str) -> Result<Vec<BookingWithCar>, BookingError> {
        let sql = format!("{SELECT_WITH_CAR} WHERE c.owner_id = ? ORDER BY b.created_at DESC");

        let bookings = sqlx::query_as::<_, BookingWithCar>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(bookings)
    }

    /// Apply a role-gated status transition. The status is persisted
    /// with a compare-and-swap on the expected current value, so a
    /// concurrent change surfaces as an invalid transition rather than
    /// silently overwriting it.
    pub async fn update_status(
        &self,
        booking_id: &str,
        actor_id: &str,
        new_status: BookingStatus,
    ) -> Result<TransitionResult, BookingError> {
        let mut with_car = self
            .find_with_car(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound)?;

        let role = if with_car.owner_id == actor_id {
            ActorRole::Owner
        } else if with_car.booking.renter_id == actor_id {
            ActorRole::Renter
        } else {
            return Err(BookingError::Unauthorized);
        };

        let from = with_car.booking.status;

        if !transition_allowed(role, from, new_status) {
            return Err(BookingError::InvalidTransition {
                from,
                to: new_status,
            });
        }

        let result = sqlx::query("UPDATE bookings SET status = ? WHERE id = ? AND status = ?")
            .bind(new_status)
            .bind(booking_id)
            .bind(from)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(BookingError::InvalidTransition {
                from,
                to: new_status,
            });
        }

        with_car.booking.status = new_status;

        Ok(TransitionResult {
            booking: with_car,
            role,
            from,
        })
    }
}
