use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Number of billable days for a rental, both endpoints inclusive.
/// A one-day rental (start == end) bills one day.
pub fn rental_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Total owed for a booking. The amount is always computed here from
/// the car's daily price and the booked range; it is never taken from
/// the client.
pub fn quote(daily_price: Decimal, start: NaiveDate, end: NaiveDate) -> Decimal {
    daily_price * Decimal::from(rental_days(start, end))
}
