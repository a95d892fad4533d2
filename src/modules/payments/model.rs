use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

use super::schema::PaymentStatus;

#[derive(Debug, Clone, FromRow)]
pub struct Payment {
    pub id: String,
    pub booking_id: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub payment_method_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PaymentMethod {
    pub id: String,
    pub user_id: String,
    pub card_type: String,
    pub last_four: String,
    pub card_holder_name: String,
    pub expiry_month: i32,
    pub expiry_year: i32,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl PaymentMethod {
    pub fn is_expired(&self) -> bool {
        let now = Utc::now();
        self.is_expired_at(now.year(), now.month() as i32)
    }

    pub fn is_expired_at(&self, year: i32, month: i32) -> bool {
        self.expiry_year < year || (self.expiry_year == year && self.expiry_month < month)
    }
}

/// Brand from the leading digit, the way card networks allocate them.
pub fn card_type_for_number(number: &str) -> &'static str {
    match number.chars().next() {
        Some('4') => "Visa",
        Some('5') => "Mastercard",
        Some('3') => "American Express",
        Some('6') => "Discover",
        _ => "Credit Card",
    }
}

/// Parse an MM/YY expiry into (month, four-digit year).
pub fn parse_expiry(expiry: &str) -> Option<(i32, i32)> {
    let (month_str, year_str) = expiry.split_once('/')?;

    let month: i32 = month_str.trim().parse().ok()?;
    let year: i32 = year_str.trim().parse().ok()?;

    if !(1..=12).contains(&month) || !(0..=99).contains(&year) {
        return None;
    }

    Some((month, year + 2000))
}
