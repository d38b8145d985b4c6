use std::sync::Arc;
use base64::{Engine as _, engine::general_purpose};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use tracing::{error, info, warn};

use crate::domain::models::booking::{Booking, PaymentStatus};
use crate::domain::models::gateway::GatewayTxStatus;
use crate::domain::models::job::{Job, JOB_FAILURE_EMAIL, JOB_SHEET_SYNC, JOB_TICKET_EMAIL};
use crate::domain::models::webhook::{PaymentWebhook, ProcessedWebhook};
use crate::domain::ports::{BookingRepository, Clock, PaymentGateway, WebhookLogRepository};
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

pub fn compute_signature(payload: &str, secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(payload.as_bytes());
    general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Processed,
    AlreadyProcessed,
    Ignored,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifiedPayment {
    pub order_id: String,
    pub status: &'static str,
    pub reference_number: Option<String>,
    pub reason: Option<String>,
}

fn normalize_status(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "pending",
        PaymentStatus::Completed | PaymentStatus::Refunded => "completed",
        PaymentStatus::Failed => "failed",
    }
}

/// Both completion channels end up here. The conditional update in the
/// booking store is the only transition point, so whichever channel observes
/// success first wins and the other becomes a no-op.
pub struct ReconciliationService {
    booking_repo: Arc<dyn BookingRepository>,
    webhook_repo: Arc<dyn WebhookLogRepository>,
    gateway: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
    webhook_secret: String,
}

impl ReconciliationService {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        webhook_repo: Arc<dyn WebhookLogRepository>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
        webhook_secret: String,
    ) -> Self {
        Self { booking_repo, webhook_repo, gateway, clock, webhook_secret }
    }

    fn verify_signature(&self, webhook: &PaymentWebhook) -> Result<(), AppError> {
        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(webhook.signature_payload().as_bytes());

        let provided = general_purpose::STANDARD
            .decode(&webhook.signature)
            .map_err(|_| {
                error!(
                    "Webhook signature for order {} is not valid base64",
                    webhook.order_id
                );
                AppError::BadSignature
            })?;

        mac.verify_slice(&provided).map_err(|_| {
            error!(
                "Webhook signature mismatch for order {} (txStatus {}, amount {})",
                webhook.order_id, webhook.tx_status, webhook.order_amount
            );
            AppError::BadSignature
        })
    }

    pub async fn handle_webhook(&self, webhook: PaymentWebhook) -> Result<WebhookOutcome, AppError> {
        self.verify_signature(&webhook)?;

        let key = webhook.idempotency_key();
        if self.webhook_repo.is_processed(&key).await? {
            info!("Webhook replay for order {} short-circuited (key {})", webhook.order_id, key);
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        let booking = self.booking_repo.find_by_order_id(&webhook.order_id).await?
            .ok_or_else(|| AppError::NotFound(format!("No booking for order {}", webhook.order_id)))?;

        info!(
            "Webhook for booking {} (ref {}): txStatus {}",
            booking.id, booking.reference_number, webhook.tx_status
        );

        match GatewayTxStatus::from_gateway(&webhook.tx_status) {
            GatewayTxStatus::Success => {
                self.apply_success(
                    &booking,
                    Some(webhook.reference_id.clone()),
                    Some(webhook.payment_mode.clone()),
                ).await?;
            }
            GatewayTxStatus::Failed => {
                self.apply_failure(
                    &booking,
                    Some(webhook.reference_id.clone()),
                    Some(webhook.payment_mode.clone()),
                ).await?;
            }
            GatewayTxStatus::Pending => {
                // Not recorded as processed: a later retry carrying a terminal
                // status must still apply.
                warn!(
                    "Webhook for order {} carries non-terminal status {}, ignoring",
                    webhook.order_id, webhook.tx_status
                );
                return Ok(WebhookOutcome::Ignored);
            }
        }

        let entry = ProcessedWebhook::new(
            key,
            webhook.order_id.clone(),
            webhook.tx_status.clone(),
            self.clock.now(),
        );
        self.webhook_repo.record(&entry).await?;

        Ok(WebhookOutcome::Processed)
    }

    /// Channel B: the browser came back from the gateway. Ask the gateway for
    /// the authoritative status instead of trusting the redirect, and route
    /// any terminal answer through the same transition path as the webhook.
    pub async fn verify_payment(&self, order_id: &str) -> Result<VerifiedPayment, AppError> {
        let booking = self.booking_repo.find_by_order_id(order_id).await?
            .ok_or_else(|| AppError::NotFound(format!("No booking for order {}", order_id)))?;

        let gateway_status = match self.gateway.order_status(order_id).await {
            Ok(status) => status,
            Err(e) => {
                warn!(
                    "Gateway status query failed for order {}: {}; answering from stored status",
                    order_id, e
                );
                return Ok(VerifiedPayment {
                    order_id: order_id.to_string(),
                    status: normalize_status(booking.payment_status),
                    reference_number: Some(booking.reference_number),
                    reason: None,
                });
            }
        };

        let status = match gateway_status.status {
            GatewayTxStatus::Success => {
                self.apply_success(&booking, gateway_status.payment_id, gateway_status.payment_method).await?;
                "completed"
            }
            GatewayTxStatus::Failed => {
                self.apply_failure(&booking, gateway_status.payment_id, gateway_status.payment_method).await?;
                "failed"
            }
            GatewayTxStatus::Pending => "pending",
        };

        Ok(VerifiedPayment {
            order_id: order_id.to_string(),
            status,
            reference_number: Some(booking.reference_number),
            reason: gateway_status.failure_reason,
        })
    }

    async fn apply_success(
        &self,
        booking: &Booking,
        payment_id: Option<String>,
        payment_method: Option<String>,
    ) -> Result<Option<Booking>, AppError> {
        let now = self.clock.now();
        let jobs = vec![
            Job::new(JOB_TICKET_EMAIL, booking.id.clone(), now),
            Job::new(JOB_SHEET_SYNC, booking.id.clone(), now),
        ];

        let updated = self.booking_repo
            .update_status(&booking.gateway_order_id, PaymentStatus::Completed, payment_id, payment_method, now, jobs)
            .await?;

        match &updated {
            Some(b) => info!("Booking {} completed (payment {:?})", b.id, b.gateway_payment_id),
            None => info!("Booking {} already finalized, completion is a no-op", booking.id),
        }

        Ok(updated)
    }

    async fn apply_failure(
        &self,
        booking: &Booking,
        payment_id: Option<String>,
        payment_method: Option<String>,
    ) -> Result<Option<Booking>, AppError> {
        let now = self.clock.now();
        let jobs = vec![Job::new(JOB_FAILURE_EMAIL, booking.id.clone(), now)];

        let updated = self.booking_repo
            .update_status(&booking.gateway_order_id, PaymentStatus::Failed, payment_id, payment_method, now, jobs)
            .await?;

        match &updated {
            Some(b) => info!("Booking {} marked failed", b.id),
            None => info!("Booking {} already finalized, failure is a no-op", booking.id),
        }

        Ok(updated)
    }
}
