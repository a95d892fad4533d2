use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::environment::SmtpConfig;
use super::{NotificationChannel, NotificationEvent, NotificationKind, NotifyError, Recipient};

/// Email channel: renders a type-specific plain-text template and sends
/// it over SMTP. A fresh transport is built per message to avoid
/// connection pooling issues.
pub struct EmailChannel {
    config: SmtpConfig,
}

impl EmailChannel {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn build_transport(&self) -> Result<SmtpTransport, NotifyError> {
        Ok(SmtpTransport::relay(&self.config.host)
            .map_err(|e| NotifyError::Transport(format!("SMTP relay error: {e}")))?
            .port(self.config.port)
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .build())
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn deliver(&self, event: &NotificationEvent, recipient: &Recipient) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(
                self.config
                    .from_address
                    .parse()
                    .map_err(|e| NotifyError::Message(format!("Invalid from address: {e}")))?,
            )
            .to(recipient
                .email
                .parse()
                .map_err(|e| NotifyError::Message(format!("Invalid to address: {e}")))?)
            .subject(subject_for(event.kind))
            .body(render_body(event, recipient))
            .map_err(|e| NotifyError::Message(format!("Failed to build email: {e}")))?;

        let mailer = self.build_transport()?;

        tokio::task::spawn_blocking(move || {
            mailer
                .send(&email)
                .map_err(|e| NotifyError::Transport(format!("Failed to send email: {e}")))
        })
        .await
        .map_err(|e| NotifyError::Transport(format!("Email task failed: {e}")))?
        .map(|_| ())
    }
}

pub fn subject_for(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::BookingRequest => "DriveShare: New Booking Request",
        NotificationKind::BookingCreated => "DriveShare: Booking Request Received",
        NotificationKind::BookingConfirmed => "DriveShare: Booking Confirmed",
        NotificationKind::BookingRejected => "DriveShare: Booking Rejected",
        NotificationKind::BookingCancelled => "DriveShare: Booking Cancelled",
        NotificationKind::PaymentConfirmation => "DriveShare: Payment Confirmation",
        NotificationKind::Message => "DriveShare Notification",
    }
}

pub fn render_body(event: &NotificationEvent, recipient: &Recipient) -> String {
    let car = event.car_model.as_deref().unwrap_or("your car");
    let dates = match (event.start_date, event.end_date) {
        (Some(s), Some(e)) => format!("{} to {}", s.format("%Y-%m-%d"), e.format("%Y-%m-%d")),
        _ => "the booked dates".to_string(),
    };

    match event.kind {
        NotificationKind::BookingRequest => format!(
            "Hello {},\n\n\
             You have received a new booking request for {} ({}).\n\
             Please log in to your DriveShare account to confirm or reject it.\n\n\
             Thank you for using DriveShare!",
            recipient.name, car, dates
        ),
        NotificationKind::BookingCreated => format!(
            "Hello {},\n\n\
             Your booking request for {} ({}) has been received.\n\
             The car owner will review your request soon.\n\n\
             Thank you for using DriveShare!",
            recipient.name, car, dates
        ),
        NotificationKind::BookingConfirmed => format!(
            "Hello {},\n\n\
             Great news! Your booking for {} ({}) has been confirmed.\n\
             You can now proceed to make the payment.\n\n\
             Thank you for using DriveShare!",
            recipient.name, car, dates
        ),
        NotificationKind::BookingRejected => format!(
            "Hello {},\n\n\
             We regret to inform you that your booking request for {} ({}) \
             has been rejected by the car owner.\n\
             Please try booking another car or different dates.\n\n\
             Thank you for using DriveShare!",
            recipient.name, car, dates
        ),
        NotificationKind::BookingCancelled => format!(
            "Hello {},\n\n\
             This is a confirmation that the booking for {} ({}) has been cancelled.\n\
             If you have any questions, please contact our support team.\n\n\
             Thank you for using DriveShare!",
            recipient.name, car, dates
        ),
        NotificationKind::PaymentConfirmation => {
            let amount = event
                .amount
                .map(|a| format!("${a}"))
                .unwrap_or_else(|| "the agreed amount".to_string());
            format!(
                "Hello {},\n\n\
                 A payment of {} has been processed for the booking of {} ({}).\n\n\
                 Thank you for choosing DriveShare!",
                recipient.name, amount, car, dates
            )
        }
        NotificationKind::Message => {
            let message = event
                .message
                .as_deref()
                .unwrap_or("You have a new notification");
            format!("Hello {},\n\n{}\n\nThank you for using DriveShare!", recipient.name, message)
        }
    }
}
