use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use rand::Rng;

use crate::domain::services::lifecycle;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub invite_code: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub ticket_type: String,
    pub ticket_count: i32,
    pub total_amount: i64,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub gateway_order_id: String,
    pub gateway_payment_id: Option<String>,
    pub reference_number: String,
    pub email_sent: bool,
    pub checked_in: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub struct NewBookingParams {
    pub invite_code: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub ticket_type: String,
    pub ticket_count: i32,
    pub total_amount: i64,
    pub reference_prefix: String,
}

impl Booking {
    pub fn new(params: NewBookingParams, now: DateTime<Utc>) -> Self {
        let id = Uuid::new_v4().to_string();

        Self {
            gateway_order_id: id.clone(),
            id,
            invite_code: params.invite_code,
            customer_name: params.customer_name,
            customer_email: params.customer_email,
            customer_phone: params.customer_phone,
            ticket_type: params.ticket_type,
            ticket_count: params.ticket_count,
            total_amount: params.total_amount,
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            gateway_payment_id: None,
            reference_number: generate_reference(&params.reference_prefix, now),
            email_sent: false,
            checked_in: false,
            created_at: now,
            updated_at: now,
            expires_at: now + lifecycle::expiry_window(),
        }
    }
}

// No 0/O/1/I: references are read aloud at the gate and typed back in.
const REFERENCE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub fn generate_reference(prefix: &str, now: DateTime<Utc>) -> String {
    let digits = now.timestamp_millis().rem_euclid(1_000_000);

    let mut rng = rand::thread_rng();
    let suffix: String = (0..4)
        .map(|_| REFERENCE_ALPHABET[rng.gen_range(0..REFERENCE_ALPHABET.len())] as char)
        .collect();

    format!("{}{:06}{}", prefix, digits, suffix)
}

#[derive(Debug, Serialize, Clone)]
pub struct InviteCodeStatus {
    pub code: String,
    pub is_valid: bool,
    pub is_used: bool,
    pub booking: Option<Booking>,
}
