use serde::Serialize;

use crate::domain::models::booking::Booking;
use crate::domain::models::gateway::GatewayOrderSession;

#[derive(Serialize)]
pub struct BookingCreatedResponse {
    pub booking: Booking,
    pub payment_session: GatewayOrderSession,
}
