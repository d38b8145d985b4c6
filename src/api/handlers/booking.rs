use axum::{extract::{State, Path}, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::requests::CreateBookingRequest;
use crate::api::dtos::responses::BookingCreatedResponse;
use crate::api::extractors::admin::AdminAuth;
use crate::domain::services::booking_service::NewBookingData;
use crate::domain::services::catalog;
use crate::error::AppError;
use crate::state::AppState;

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    info!("create_booking: request for code {}", payload.invite_code);

    if payload.invite_code.trim().is_empty() {
        return Err(AppError::Validation("invite_code is required".into()));
    }
    if payload.customer_name.trim().is_empty()
        || payload.customer_email.trim().is_empty()
        || payload.customer_phone.trim().is_empty()
    {
        return Err(AppError::Validation(
            "customer_name, customer_email and customer_phone are required".into(),
        ));
    }
    if !payload.customer_email.contains('@') {
        return Err(AppError::Validation("customer_email is not a valid email address".into()));
    }

    let ticket_type = catalog::find_ticket_type(&payload.ticket_type)
        .ok_or_else(|| AppError::Validation(format!("Unknown ticket type: {}", payload.ticket_type)))?;

    if payload.ticket_count < 1 || payload.ticket_count > ticket_type.max_per_booking {
        return Err(AppError::Validation(format!(
            "ticket_count must be between 1 and {} for {}",
            ticket_type.max_per_booking, ticket_type.id
        )));
    }

    let checkout = state.booking_service.create_booking(NewBookingData {
        invite_code: payload.invite_code,
        customer_name: payload.customer_name.trim().to_string(),
        customer_email: payload.customer_email.trim().to_string(),
        customer_phone: payload.customer_phone.trim().to_string(),
        ticket_type,
        ticket_count: payload.ticket_count,
    }).await?;

    Ok(Json(BookingCreatedResponse {
        booking: checkout.booking,
        payment_session: checkout.payment_session,
    }))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_repo.find_by_id(&booking_id).await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;
    Ok(Json(booking))
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.booking_repo.list_all().await?;
    Ok(Json(bookings))
}

pub async fn refund_booking(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_repo.find_by_id(&booking_id).await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;

    let refunded = state.booking_repo.mark_refunded(&booking.id, state.clock.now()).await?
        .ok_or(AppError::Conflict("Only completed bookings can be refunded".into()))?;

    // The invite code stays burned: a refunded booking keeps occupying it.
    info!("Booking {} refunded by admin", refunded.id);
    Ok(Json(refunded))
}
