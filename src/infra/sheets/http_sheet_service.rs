use crate::domain::models::booking::Booking;
use crate::domain::ports::{InviteSource, SheetSync};
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use std::time::Duration;

// One spreadsheet backs both concerns: the invite-code list lives in it and
// paid bookings are written back into it, so a single adapter covers both
// ports.
pub struct HttpSheetService {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpSheetService {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_url,
            api_key,
        }
    }
}

#[derive(Deserialize)]
struct CodesResponse {
    codes: Vec<String>,
}

#[async_trait]
impl InviteSource for HttpSheetService {
    async fn fetch_codes(&self) -> Result<Vec<String>, AppError> {
        let res = self.client.get(&self.api_url)
            .query(&[("action", "codes")])
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| AppError::InternalWithMsg(format!("Sheet service connection error: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            return Err(AppError::InternalWithMsg(format!("Sheet service failed. Status: {}", status)));
        }

        let parsed: CodesResponse = res.json().await
            .map_err(|e| AppError::InternalWithMsg(format!("Unexpected sheet response: {}", e)))?;

        Ok(parsed.codes)
    }
}

#[async_trait]
impl SheetSync for HttpSheetService {
    async fn upsert_booking_row(&self, booking: &Booking) -> Result<(), AppError> {
        let payload = json!({
            "action": "upsert_booking",
            "invite_code": booking.invite_code,
            "reference_number": booking.reference_number,
            "customer_name": booking.customer_name,
            "customer_email": booking.customer_email,
            "customer_phone": booking.customer_phone,
            "ticket_type": booking.ticket_type,
            "ticket_count": booking.ticket_count,
            "total_amount": booking.total_amount,
            "payment_status": booking.payment_status.as_str(),
        });

        let res = self.client.post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Sheet service connection error: {}", e);
                error!("{}", msg);
                AppError::InternalWithMsg(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Sheet sync failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::InternalWithMsg(msg));
        }

        Ok(())
    }
}
