use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// STATUS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// PROCESS / REFUND
// =============================================================================

/// The amount is never part of the request; settlement recomputes it
/// from the booking.
#[derive(Debug, Deserialize)]
pub struct ProcessPaymentRequest {
    pub booking_id: String,
    pub payment_method_id: Option<String>,
    pub card: Option<NewCardInput>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewCardInput {
    pub card_holder_name: String,
    pub card_number: String,
    /// MM/YY
    pub expiry_date: String,
    pub cvv: String,
    #[serde(default)]
    pub save_card: bool,
    #[serde(default)]
    pub make_default: bool,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub booking_id: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub payment_method_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<crate::modules::payments::model::Payment> for PaymentResponse {
    fn from(p: crate::modules::payments::model::Payment) -> Self {
        Self {
            id: p.id,
            booking_id: p.booking_id,
            amount: p.amount,
            status: p.status,
            payment_method_id: p.payment_method_id,
            created_at: p.created_at,
        }
    }
}

/// Payment state for a booking; `unpaid` when no payment row exists.
#[derive(Debug, Serialize)]
pub struct BookingPaymentResponse {
    pub booking_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct PaymentHistoryResponse {
    pub payments_made: Vec<PaymentResponse>,
    pub payments_received: Vec<PaymentResponse>,
}

// =============================================================================
// PAYMENT METHODS
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreatePaymentMethodRequest {
    pub card_holder_name: String,
    pub card_number: String,
    /// MM/YY
    pub expiry_date: String,
    pub cvv: String,
    #[serde(default)]
    pub make_default: bool,
}

#[derive(Debug, Serialize)]
pub struct PaymentMethodResponse {
    pub id: String,
    pub card_type: String,
    pub last_four: String,
    pub card_holder_name: String,
    pub expiry_month: i32,
    pub expiry_year: i32,
    pub is_default: bool,
}

impl From<crate::modules::payments::model::PaymentMethod> for PaymentMethodResponse {
    fn from(m: crate::modules::payments::model::PaymentMethod) -> Self {
        Self {
            id: m.id,
            card_type: m.card_type,
            last_four: m.last_four,
            card_holder_name: m.card_holder_name,
            expiry_month: m.expiry_month,
            expiry_year: m.expiry_year,
            is_default: m.is_default,
        }
    }
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
