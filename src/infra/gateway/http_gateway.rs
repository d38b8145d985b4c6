use crate::domain::models::gateway::{GatewayOrderRequest, GatewayOrderSession, GatewayOrderStatus, GatewayTxStatus};
use crate::domain::ports::PaymentGateway;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};
use std::time::Duration;
use tokio::time::sleep;

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

pub struct HttpPaymentGateway {
    client: Client,
    base_url: String,
    app_id: String,
    secret_key: String,
    return_base_url: String,
}

impl HttpPaymentGateway {
    pub fn new(base_url: String, app_id: String, secret_key: String, return_base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url,
            app_id,
            secret_key,
            return_base_url,
        }
    }

    async fn send_with_retry(&self, request: reqwest::RequestBuilder) -> Result<serde_json::Value, AppError> {
        let mut retries = 0;
        let mut backoff = INITIAL_BACKOFF_MS;

        loop {
            let attempt = request.try_clone()
                .ok_or_else(|| AppError::InternalWithMsg("Gateway request is not retryable".to_string()))?;

            match attempt.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json().await.map_err(|e| {
                            error!("Failed to parse gateway response JSON: {:?}", e);
                            AppError::Gateway(format!("Unparseable gateway response: {}", e))
                        });
                    } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                        if retries >= MAX_RETRIES {
                            let text = response.text().await.unwrap_or_default();
                            error!("Gateway failed after {} retries. Status: {}, Body: {}", retries, status, text);
                            return Err(AppError::Gateway(format!("{} - {}", status, text)));
                        }
                        warn!("Gateway transient error {}. Retrying in {}ms...", status, backoff);
                    } else {
                        let text = response.text().await.unwrap_or_default();
                        error!("Gateway terminal error {}: {}", status, text);
                        return Err(AppError::Gateway(format!("{} - {}", status, text)));
                    }
                }
                Err(e) => {
                    if retries >= MAX_RETRIES {
                        error!("Gateway network error after {} retries: {:?}", retries, e);
                        return Err(AppError::Gateway(format!("network error: {}", e)));
                    }
                    warn!("Gateway network error. Retrying in {}ms... {:?}", backoff, e);
                }
            }

            sleep(Duration::from_millis(backoff)).await;
            retries += 1;
            backoff *= 2;
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderTokenResponse {
    cftoken: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderStatusResponse {
    tx_status: Option<String>,
    reference_id: Option<String>,
    payment_mode: Option<String>,
    tx_msg: Option<String>,
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<GatewayOrderSession, AppError> {
        let url = format!("{}/api/v2/cftoken/order", self.base_url);
        let payload = json!({
            "orderId": request.order_id,
            "orderAmount": format!("{}.00", request.amount),
            "orderCurrency": request.currency,
            "customerName": request.customer_name,
            "customerEmail": request.customer_email,
            "customerPhone": request.customer_phone,
            "returnUrl": format!("{}/payment/return?order_id={}", self.return_base_url, request.order_id),
        });

        info!("Creating gateway order {} for amount {}", request.order_id, request.amount);

        let body = self.send_with_retry(
            self.client.post(&url)
                .header("x-client-id", &self.app_id)
                .header("x-client-secret", &self.secret_key)
                .json(&payload)
        ).await?;

        let token: OrderTokenResponse = serde_json::from_value(body)
            .map_err(|e| AppError::Gateway(format!("Order response missing session token: {}", e)))?;

        Ok(GatewayOrderSession {
            order_id: request.order_id.clone(),
            session_token: token.cftoken,
            amount: request.amount,
            currency: request.currency.clone(),
        })
    }

    async fn order_status(&self, order_id: &str) -> Result<GatewayOrderStatus, AppError> {
        let url = format!("{}/api/v2/orders/{}/status", self.base_url, order_id);

        let body = self.send_with_retry(
            self.client.get(&url)
                .header("x-client-id", &self.app_id)
                .header("x-client-secret", &self.secret_key)
        ).await?;

        let parsed: OrderStatusResponse = serde_json::from_value(body)
            .map_err(|e| AppError::Gateway(format!("Unexpected order status shape: {}", e)))?;

        let raw_status = parsed.tx_status.unwrap_or_else(|| "PENDING".to_string());
        let status = GatewayTxStatus::from_gateway(&raw_status);

        Ok(GatewayOrderStatus {
            status,
            payment_id: parsed.reference_id,
            payment_method: parsed.payment_mode,
            failure_reason: if status == GatewayTxStatus::Failed { parsed.tx_msg } else { None },
        })
    }
}
