use chrono::Utc;
use sqlx::{MySql, Pool};
use uuid::Uuid;

use super::model::Message;

#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Message not found")]
    MessageNotFound,

    #[error("Booking not found")]
    BookingNotFound,

    #[error("Receiver not found")]
    ReceiverNotFound,

    #[error("You are not authorized for this conversation")]
    Unauthorized,

    #[error("Message cannot be empty")]
    EmptyContent,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl MessageError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::MessageNotFound | Self::BookingNotFound | Self::ReceiverNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::Unauthorized => StatusCode::FORBIDDEN,
            Self::EmptyContent => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct MessageCrud {
    pool: Pool<MySql>,
}

impl MessageCrud {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// Send a message. A booking-scoped message must go between the
    /// booking's two parties.
    pub async fn send(
        &self,
        sender_id: &str,
        receiver_id: &str,
        booking_id: Option<&str>,
        content: &str,
    ) -> Result<Message, MessageError> {
        if content.trim().is_empty() {
            return Err(MessageError::EmptyContent);
        }

        let receiver_exists: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE id = ?")
            .bind(receiver_id)
            .fetch_one(&self.pool)
            .await?;

        if receiver_exists.0 == 0 {
            return Err(MessageError::ReceiverNotFound);
        }

        if let Some(booking_id) = booking_id {
            let parties: Option<(String, String)> = sqlx::query_as(
                r#"
                SELECT b.renter_id, c.owner_id
                FROM bookings b
                JOIN cars c ON c.id = b.car_id
                WHERE b.id = ?
                "#,
            )
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await?;

            let (renter_id, owner_id) = parties.ok_or(MessageError::BookingNotFound)?;

            let sender_is_party = sender_id == renter_id || sender_id == owner_id;
            let receiver_is_party = receiver_id == renter_id || receiver_id == owner_id;

            if !sender_is_party || !receiver_is_party || sender_id == receiver_id {
                return Err(MessageError::Unauthorized);
            }
        }

        let message = Message {
            id: Uuid::new_v4().to_string(),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            booking_id: booking_id.map(|s| s.to_string()),
            content: content.to_string(),
            is_read: false,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO messages (id, sender_id, receiver_id, booking_id, content, is_read, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.id)
        .bind(&message.sender_id)
        .bind(&message.receiver_id)
        .bind(&message.booking_id)
        .bind(&message.content)
        .bind(message.is_read)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;

        Ok(message)
    }

    pub async fn conversation(
        &self,
        user_id: &str,
        other_id: &str,
    ) -> Result<Vec<Message>, MessageError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM messages
            WHERE (sender_id = ? AND receiver_id = ?)
               OR (sender_id = ? AND receiver_id = ?)
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .bind(other_id)
        .bind(other_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    pub async fn booking_thread(
        &self,
        booking_id: &str,
        user_id: &str,
    ) -> Result<Vec<Message>, MessageError> {
        let parties: Option<(String, String)> = sqlx::query_as(
            r#"
            SELECT b.renter_id, c.owner_id
            FROM bookings b
            JOIN cars c ON c.id = b.car_id
            WHERE b.id = ?
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        let (renter_id, owner_id) = parties.ok_or(MessageError::BookingNotFound)?;

        if user_id != renter_id && user_id != owner_id {
            return Err(MessageError::Unauthorized);
        }

        let messages = sqlx::query_as::<_, Message>(
            "SELECT * FROM messages WHERE booking_id = ? ORDER BY created_at",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    /// The read flag is the only mutation messages support, and only
    /// the receiver may flip it.
    pub async fn mark_read(&self, message_id: &str, user_id: &str) -> Result<Message, MessageError> {
        let mut message = sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = ?")
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(MessageError::MessageNotFound)?;

        if message.receiver_id != user_id {
            return Err(MessageError::Unauthorized);
        }

        sqlx::query("UPDATE messages SET is_read = TRUE WHERE id = ?")
            .bind(message_id)
            .execute(&self.pool)
            .await?;

        message.is_read = true;

        Ok(message)
    }

    pub async fn unread_count(&self, user_id: &str) -> Result<i64, MessageError> {
        let result: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM messages WHERE receiver_id = ? AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }
}
