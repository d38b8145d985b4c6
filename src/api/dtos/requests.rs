use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub invite_code: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub ticket_type: String,
    pub ticket_count: i32,
}

#[derive(Deserialize)]
pub struct VerifyPaymentRequest {
    pub order_id: String,
}

#[derive(Deserialize)]
pub struct InviteCheckRequest {
    pub invite_code: String,
}
