pub mod email;
pub mod inapp;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

pub use email::EmailChannel;
pub use inapp::InAppChannel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingRequest,
    BookingCreated,
    BookingConfirmed,
    BookingRejected,
    BookingCancelled,
    PaymentConfirmation,
    Message,
}

/// One logical event, fanned out to every channel for every recipient.
/// Fields are optional because not every kind carries every detail.
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub kind: NotificationKind,
    pub booking_id: Option<String>,
    pub car_model: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
    pub message: Option<String>,
}

impl NotificationEvent {
    pub fn new(kind: NotificationKind) -> Self {
        Self {
            kind,
            booking_id: None,
            car_model: None,
            start_date: None,
            end_date: None,
            amount: None,
            message: None,
        }
    }

    pub fn booking_id(mut self, id: impl Into<String>) -> Self {
        self.booking_id = Some(id.into());
        self
    }

    pub fn car_model(mut self, model: impl Into<String>) -> Self {
        self.car_model = Some(model.into());
        self
    }

    pub fn dates(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct Recipient {
    pub user_id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Failed to build message: {0}")]
    Message(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &'static str;

    async fn deliver(&self, event: &NotificationEvent, recipient: &Recipient) -> Result<(), NotifyError>;
}

/// Fan-out over an open list of channels. Delivery is best-effort and
/// independent per channel: an error is logged and dropped, it never
/// rolls back the operation that raised the event and is never retried.
/// Callers that notify twice send twice; there is no dedup.
pub struct Notifier {
    channels: Vec<Box<dyn NotificationChannel>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self { channels: Vec::new() }
    }

    pub fn register(mut self, channel: Box<dyn NotificationChannel>) -> Self {
        self.channels.push(channel);
        self
    }

    pub async fn notify(&self, event: &NotificationEvent, recipients: &[Recipient]) {
        for channel in &self.channels {
            for recipient in recipients {
                if let Err(e) = channel.deliver(event, recipient).await {
                    tracing::warn!(
                        "{} notification to user {} failed: {}",
                        channel.name(),
                        recipient.user_id,
                        e
                    );
                }
            }
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Look up the delivery details for a user. A missing user yields no
/// recipient; the caller simply has nobody to notify.
pub async fn recipient_for(
    pool: &crate::config::DbPool,
    user_id: &str,
) -> Result<Option<Recipient>, sqlx::Error> {
    let row: Option<(String, String, String)> =
        sqlx::query_as("SELECT id, email, name FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|(user_id, email, name)| Recipient {
        user_id,
        email,
        name,
    }))
}
