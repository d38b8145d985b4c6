use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::api::dtos::requests::VerifyPaymentRequest;
use crate::domain::models::webhook::PaymentWebhook;
use crate::domain::services::reconciliation::WebhookOutcome;
use crate::error::AppError;
use crate::state::AppState;

pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PaymentWebhook>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.reconciliation.handle_webhook(payload).await?;

    let status = match outcome {
        WebhookOutcome::Processed => "processed",
        WebhookOutcome::AlreadyProcessed => "already_processed",
        WebhookOutcome::Ignored => "ignored",
    };

    Ok(Json(json!({ "status": status })))
}

pub async fn verify_payment(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.order_id.trim().is_empty() {
        return Err(AppError::Validation("order_id is required".into()));
    }

    let verified = state.reconciliation.verify_payment(&payload.order_id).await?;
    Ok(Json(verified))
}
