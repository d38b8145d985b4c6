use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::dtos::requests::InviteCheckRequest;
use crate::error::AppError;
use crate::state::AppState;

pub async fn check_invite(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<InviteCheckRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.invite_code.trim().is_empty() {
        return Err(AppError::Validation("invite_code is required".into()));
    }

    let status = state.booking_service.invite_status(&payload.invite_code).await?;
    Ok(Json(status))
}
