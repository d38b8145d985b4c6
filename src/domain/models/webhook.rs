use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

// The gateway posts camelCase JSON; deserialization doubles as the shape check,
// so nothing malformed ever reaches the reconciliation path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentWebhook {
    pub order_id: String,
    pub order_amount: String,
    pub reference_id: String,
    pub tx_status: String,
    pub payment_mode: String,
    pub tx_msg: String,
    pub tx_time: String,
    pub signature: String,
}

impl PaymentWebhook {
    // Canonical concatenation the gateway signs, in field order.
    pub fn signature_payload(&self) -> String {
        format!(
            "{}{}{}{}{}{}{}",
            self.order_id,
            self.order_amount,
            self.reference_id,
            self.tx_status,
            self.payment_mode,
            self.tx_msg,
            self.tx_time
        )
    }

    // Keyed on the gateway payment reference, which is mandatory in the payload.
    // Retries of the same payment event always carry the same referenceId.
    pub fn idempotency_key(&self) -> String {
        format!("{}:{}", self.order_id, self.reference_id)
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct ProcessedWebhook {
    pub idempotency_key: String,
    pub order_id: String,
    pub tx_status: String,
    pub received_at: DateTime<Utc>,
}

impl ProcessedWebhook {
    pub fn new(idempotency_key: String, order_id: String, tx_status: String, received_at: DateTime<Utc>) -> Self {
        Self {
            idempotency_key,
            order_id,
            tx_status,
            received_at,
        }
    }
}
