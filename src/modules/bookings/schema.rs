use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// STATUS & TRANSITIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Completed and cancelled accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the booking the authenticated user is acting as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRole {
    Owner,
    Renter,
}

/// The full transition table. Anything not listed here is rejected.
pub fn transition_allowed(role: ActorRole, from: BookingStatus, to: BookingStatus) -> bool {
    use BookingStatus::*;

    match (role, from, to) {
        (ActorRole::Owner, Pending, Confirmed | Cancelled) => true,
        (ActorRole::Owner, Confirmed, Completed | Cancelled) => true,
        (ActorRole::Renter, Pending | Confirmed, Cancelled) => true,
        _ => false,
    }
}

// =============================================================================
// REQUESTS
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub car_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

// =============================================================================
// RESPONSES
// =============================================================================

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: String,
    pub car_id: String,
    pub car_model: String,
    pub renter_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BookingStatus,
    pub total_price: Decimal,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct BookingListResponse {
    pub my_bookings: Vec<BookingResponse>,
    pub received_bookings: Vec<BookingResponse>,
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
