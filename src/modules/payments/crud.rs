use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{MySql, Pool};
use uuid::Uuid;

use super::model::{Payment, PaymentMethod};
use super::schema::PaymentStatus;
use crate::modules::bookings::model::BookingWithCar;
use crate::modules::bookings::schema::BookingStatus;
use crate::services::gateway::PaymentGateway;
use crate::services::pricing;

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Booking not found")]
    BookingNotFound,

    #[error("Payment not found")]
    PaymentNotFound,

    #[error("Payment method not found")]
    MethodNotFound,

    #[error("You are not authorized for this payment")]
    Unauthorized,

    #[error("This booking is not available for payment")]
    BookingNotPayable,

    #[error("Only a completed payment can be refunded")]
    NotRefundable,

    #[error("The selected card is expired")]
    CardExpired,

    #[error("Invalid card details: {0}")]
    InvalidCard(String),

    #[error("Payment processing failed: {0}")]
    Processing(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl PaymentError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::BookingNotFound | Self::PaymentNotFound | Self::MethodNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::Unauthorized => StatusCode::FORBIDDEN,
            Self::BookingNotPayable | Self::NotRefundable | Self::CardExpired
            | Self::InvalidCard(_) => StatusCode::BAD_REQUEST,
            Self::Processing(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// What settlement did, so the caller knows whether to fan out
/// notifications. A replayed request returns the payment untouched and
/// must not notify again.
pub enum SettlementOutcome {
    Settled { amount: Decimal },
    AlreadyProcessed,
}

pub struct SettlementResult {
    pub payment: Payment,
    pub outcome: SettlementOutcome,
    pub booking: BookingWithCar,
}

pub struct RefundResult {
    pub payment: Payment,
    pub booking: BookingWithCar,
}

pub struct PaymentCrud {
    pool: Pool<MySql>,
}

impl PaymentCrud {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    pub async fn find_by_booking(&self, booking_id: &str) -> Result<Option<Payment>, PaymentError> {
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE booking_id = ?")
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(payment)
    }

    async fn find_booking_with_car(
        &self,
        booking_id: &str,
    ) -> Result<Option<BookingWithCar>, PaymentError> {
        let booking = sqlx::query_as::<_, BookingWithCar>(
            r#"
            SELECT b.id, b.car_id, b.renter_id, b.start_date, b.end_date, b.status,
                   b.created_at, b.updated_at,
                   c.model AS car_model, c.daily_price, c.owner_id
            FROM bookings b
            JOIN cars c ON c.id = b.car_id
            WHERE b.id = ?
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    /// Settle a booking. The amount is recomputed from the booked range
    /// and the car's daily price; nothing client-supplied is trusted.
    ///
    /// Idempotent against duplicate submission: an existing completed
    /// or pending payment comes back unchanged. A failed payment row is
    /// reset and retried. The booking row is locked for the duration of
    /// the attempt, so a duplicate waits rather than double-charging.
    pub async fn process_payment(
        &self,
        booking_id: &str,
        renter_id: &str,
        payment_method_id: Option<&str>,
        gateway: &dyn PaymentGateway,
    ) -> Result<SettlementResult, PaymentError> {
        let booking = self
            .find_booking_with_car(booking_id)
            .await?
            .ok_or(PaymentError::BookingNotFound)?;

        if booking.booking.renter_id != renter_id {
            return Err(PaymentError::Unauthorized);
        }

        if !matches!(
            booking.booking.status,
            BookingStatus::Pending | BookingStatus::Confirmed
        ) {
            return Err(PaymentError::BookingNotPayable);
        }

        if let Some(method_id) = payment_method_id {
            let method = self
                .find_method(method_id)
                .await?
                .ok_or(PaymentError::MethodNotFound)?;

            if method.user_id != renter_id {
                return Err(PaymentError::Unauthorized);
            }

            if method.is_expired() {
                return Err(PaymentError::CardExpired);
            }
        }

        let amount = pricing::quote(
            booking.daily_price,
            booking.booking.start_date,
            booking.booking.end_date,
        );

        let mut tx = self.pool.begin().await?;

        // Serialize settlement attempts per booking.
        sqlx::query("SELECT id FROM bookings WHERE id = ? FOR UPDATE")
            .bind(booking_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(PaymentError::BookingNotFound)?;

        let existing = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE booking_id = ? FOR UPDATE",
        )
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await?;

        let payment = match existing {
            Some(p) if matches!(p.status, PaymentStatus::Completed | PaymentStatus::Pending) => {
                tx.commit().await?;
                return Ok(SettlementResult {
                    payment: p,
                    outcome: SettlementOutcome::AlreadyProcessed,
                    booking,
                });
            }
            Some(mut p) => {
                // A failed attempt is reset and retried.
                p.amount = amount;
                p.status = PaymentStatus::Pending;
                p.payment_method_id = payment_method_id.map(|s| s.to_string());

                sqlx::query(
                    "UPDATE payments SET amount = ?, status = ?, payment_method_id = ? WHERE id = ?",
                )
                .bind(p.amount)
                .bind(p.status)
                .bind(&p.payment_method_id)
                .bind(&p.id)
                .execute(&mut *tx)
                .await?;

                p
            }
            None => {
                let now = Utc::now();
                let p = Payment {
                    id: Uuid::new_v4().to_string(),
                    booking_id: booking_id.to_string(),
                    amount,
                    status: PaymentStatus::Pending,
                    payment_method_id: payment_method_id.map(|s| s.to_string()),
                    created_at: now,
                    updated_at: now,
                };

                sqlx::query(
                    r#"
                    INSERT INTO payments (id, booking_id, amount, status, payment_method_id, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&p.id)
                .bind(&p.booking_id)
                .bind(p.amount)
                .bind(p.status)
                .bind(&p.payment_method_id)
                .bind(p.created_at)
                .bind(p.updated_at)
                .execute(&mut *tx)
                .await?;

                p
            }
        };

        match gateway
            .transfer(&booking.booking.renter_id, &booking.owner_id, amount)
            .await
        {
            Ok(()) => {
                sqlx::query("UPDATE payments SET status = ? WHERE id = ?")
                    .bind(PaymentStatus::Completed)
                    .bind(&payment.id)
                    .execute(&mut *tx)
                    .await?;

                // Settlement confirms a pending booking; an already
                // confirmed one is left as it is.
                sqlx::query("UPDATE bookings SET status = ? WHERE id = ? AND status = ?")
                    .bind(BookingStatus::Confirmed)
                    .bind(booking_id)
                    .bind(BookingStatus::Pending)
                    .execute(&mut *tx)
                    .await?;

                tx.commit().await?;

                let mut booking = booking;
                booking.booking.status = BookingStatus::Confirmed;

                let mut payment = payment;
                payment.status = PaymentStatus::Completed;

                Ok(SettlementResult {
                    payment,
                    outcome: SettlementOutcome::Settled { amount },
                    booking,
                })
            }
            Err(e) => {
                // The failed attempt is recorded; the booking stays
                // untouched and nothing retries automatically.
                sqlx::query("UPDATE payments SET status = ? WHERE id = ?")
                    .bind(PaymentStatus::Failed)
                    .bind(&payment.id)
                    .execute(&mut *tx)
                    .await?;

                tx.commit().await?;

                Err(PaymentError::Processing(e.to_string()))
            }
        }
    }

    /// Refund a completed payment and cancel its booking.
    pub async fn refund_payment(
        &self,
        payment_id: &str,
        actor_id: &str,
    ) -> Result<RefundResult, PaymentError> {
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = ?")
            .bind(payment_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(PaymentError::PaymentNotFound)?;

        let booking = self
            .find_booking_with_car(&payment.booking_id)
            .await?
            .ok_or(PaymentError::BookingNotFound)?;

        if booking.owner_id != actor_id {
            return Err(PaymentError::Unauthorized);
        }

        if payment.status != PaymentStatus::Completed {
            return Err(PaymentError::NotRefundable);
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE payments SET status = ? WHERE id = ?")
            .bind(PaymentStatus::Refunded)
            .bind(&payment.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE bookings SET status = ? WHERE id = ?")
            .bind(BookingStatus::Cancelled)
            .bind(&payment.booking_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let mut payment = payment;
        payment.status = PaymentStatus::Refunded;

        let mut booking = booking;
        booking.booking.status = BookingStatus::Cancelled;

        Ok(RefundResult { payment, booking })
    }

    pub async fn history(
        &self,
        user_id: &str,
    ) -> Result<(Vec<Payment>, Vec<Payment>), PaymentError> {
        let made = sqlx::query_as::<_, Payment>(
            r#"
            SELECT p.* FROM payments p
            JOIN bookings b ON b.id = p.booking_id
            WHERE b.renter_id = ?
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let received = sqlx::query_as::<_, Payment>(
            r#"
            SELECT p.* FROM payments p
            JOIN bookings b ON b.id = p.booking_id
            JOIN cars c ON c.id = b.car_id
            WHERE c.owner_id = ?
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok((made, received))
    }

    pub async fn booking_parties(
        &self,
        booking_id: &str,
    ) -> Result<Option<BookingWithCar>, PaymentError> {
        self.find_booking_with_car(booking_id).await
    }

    // =========================================================================
    // PAYMENT METHODS
    // =========================================================================

    pub async fn find_method(&self, id: &str) -> Result<Option<PaymentMethod>, PaymentError> {
        let method =
            sqlx::query_as::<_, PaymentMethod>("SELECT * FROM payment_methods WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(method)
    }

    pub async fn list_methods(&self, user_id: &str) -> Result<Vec<PaymentMethod>, PaymentError> {
        let methods = sqlx::query_as::<_, PaymentMethod>(
            "SELECT * FROM payment_methods WHERE user_id = ? ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(methods)
    }

    /// Save a card. The first saved card becomes the default; marking a
    /// later card default demotes the others so at most one remains.
    pub async fn create_method(
        &self,
        user_id: &str,
        card_type: &str,
        last_four: &str,
        card_holder_name: &str,
        expiry_month: i32,
        expiry_year: i32,
        make_default: bool,
    ) -> Result<PaymentMethod, PaymentError> {
        let mut tx = self.pool.begin().await?;

        let existing: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM payment_methods WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;

        let is_default = make_default || existing.0 == 0;

        if make_default {
            sqlx::query("UPDATE payment_methods SET is_default = FALSE WHERE user_id = ?")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        let method = PaymentMethod {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            card_type: card_type.to_string(),
            last_four: last_four.to_string(),
            card_holder_name: card_holder_name.to_string(),
            expiry_month,
            expiry_year,
            is_default,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO payment_methods (
                id, user_id, card_type, last_four, card_holder_name,
                expiry_month, expiry_year, is_default, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&method.id)
        .bind(&method.user_id)
        .bind(&method.card_type)
        .bind(&method.last_four)
        .bind(&method.card_holder_name)
        .bind(method.expiry_month)
        .bind(method.expiry_year)
        .bind(method.is_default)
        .bind(method.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(method)
    }

    /// Delete a card; when the default goes, another card (if any)
    /// takes its place.
    pub async fn delete_method(&self, id: &str, user_id: &str) -> Result<(), PaymentError> {
        let method = self
            .find_method(id)
            .await?
            .ok_or(PaymentError::MethodNotFound)?;

        if method.user_id != user_id {
            return Err(PaymentError::Unauthorized);
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM payment_methods WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if method.is_default {
            sqlx::query(
                r#"
                UPDATE payment_methods SET is_default = TRUE
                WHERE user_id = ?
                ORDER BY created_at
                LIMIT 1
                "#,
            )
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    pub async fn set_default_method(&self, id: &str, user_id: &str) -> Result<(), PaymentError> {
        let method = self
            .find_method(id)
            .await?
            .ok_or(PaymentError::MethodNotFound)?;

        if method.user_id != user_id {
            return Err(PaymentError::Unauthorized);
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE payment_methods SET is_default = FALSE WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE payment_methods SET is_default = TRUE WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
