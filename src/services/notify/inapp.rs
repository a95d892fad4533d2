use async_trait::async_trait;

use super::{NotificationChannel, NotificationEvent, NotificationKind, NotifyError, Recipient};

/// In-app channel. Currently renders the notification into the log;
/// persisting rows into a notifications table is the extension point
/// for a real inbox.
pub struct InAppChannel;

#[async_trait]
impl NotificationChannel for InAppChannel {
    fn name(&self) -> &'static str {
        "in-app"
    }

    async fn deliver(&self, event: &NotificationEvent, recipient: &Recipient) -> Result<(), NotifyError> {
        tracing::info!(
            "In-app notification to user {}: {}",
            recipient.user_id,
            render_line(event)
        );
        Ok(())
    }
}

pub fn render_line(event: &NotificationEvent) -> String {
    let car = event.car_model.as_deref().unwrap_or("a car");

    match event.kind {
        NotificationKind::BookingRequest => format!("New booking request for {}.", car),
        NotificationKind::BookingCreated => format!("Your booking for {} has been created.", car),
        NotificationKind::BookingConfirmed => format!("Your booking for {} has been confirmed.", car),
        NotificationKind::BookingRejected => format!("Your booking for {} has been rejected.", car),
        NotificationKind::BookingCancelled => format!("The booking for {} has been cancelled.", car),
        NotificationKind::PaymentConfirmation => match event.amount {
            Some(amount) => format!("A payment of ${} has been processed.", amount),
            None => "A payment has been processed.".to_string(),
        },
        NotificationKind::Message => event
            .message
            .clone()
            .unwrap_or_else(|| "You have a new notification".to_string()),
    }
}
