use chrono::{DateTime, Duration, Utc};

use crate::domain::models::booking::{Booking, PaymentStatus};

pub const EXPIRY_WINDOW_MINUTES: i64 = 7;

pub fn expiry_window() -> Duration {
    Duration::minutes(EXPIRY_WINDOW_MINUTES)
}

/// Only pending bookings expire. Completed, failed and refunded rows are
/// terminal and keep their meaning forever.
pub fn is_expired(booking: &Booking, now: DateTime<Utc>) -> bool {
    booking.payment_status == PaymentStatus::Pending && now - booking.created_at > expiry_window()
}

pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}
