use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct GatewayOrderRequest {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrderSession {
    pub order_id: String,
    pub session_token: String,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayTxStatus {
    Success,
    Failed,
    Pending,
}

impl GatewayTxStatus {
    pub fn from_gateway(raw: &str) -> Self {
        match raw {
            "SUCCESS" => GatewayTxStatus::Success,
            "FAILED" | "CANCELLED" | "USER_DROPPED" => GatewayTxStatus::Failed,
            _ => GatewayTxStatus::Pending,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayOrderStatus {
    pub status: GatewayTxStatus,
    pub payment_id: Option<String>,
    pub payment_method: Option<String>,
    pub failure_reason: Option<String>,
}
