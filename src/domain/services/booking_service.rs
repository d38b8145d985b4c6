use std::sync::Arc;
use tracing::info;

use crate::domain::models::booking::{Booking, InviteCodeStatus, NewBookingParams};
use crate::domain::models::gateway::{GatewayOrderRequest, GatewayOrderSession};
use crate::domain::ports::{BookingRepository, Clock, PaymentGateway};
use crate::domain::services::catalog::{self, TicketType};
use crate::domain::services::invite_registry::InviteRegistry;
use crate::domain::services::lifecycle;
use crate::error::AppError;

pub struct NewBookingData {
    pub invite_code: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub ticket_type: &'static TicketType,
    pub ticket_count: i32,
}

pub struct CheckoutSession {
    pub booking: Booking,
    pub payment_session: GatewayOrderSession,
}

pub struct BookingService {
    booking_repo: Arc<dyn BookingRepository>,
    registry: Arc<InviteRegistry>,
    gateway: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
}

impl BookingService {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        registry: Arc<InviteRegistry>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { booking_repo, registry, gateway, clock }
    }

    pub async fn create_booking(&self, data: NewBookingData) -> Result<CheckoutSession, AppError> {
        let code = lifecycle::normalize_code(&data.invite_code);
        let now = self.clock.now();

        if !self.registry.is_valid(&code).await {
            return Err(AppError::Forbidden("Invite code is not valid".to_string()));
        }

        if let Some(existing) = self.booking_repo.find_by_invite_code(&code).await? {
            if lifecycle::is_expired(&existing, now) {
                // The only place an abandoned pending booking is physically
                // removed; the code becomes redeemable again right here.
                info!("Reclaiming expired pending booking {} for code {}", existing.id, code);
                match self.booking_repo.delete(&existing.id).await {
                    Ok(()) => {}
                    // Another request reclaimed it first.
                    Err(AppError::NotFound(_)) => {}
                    Err(e) => return Err(e),
                }
            } else {
                return Err(AppError::InviteCodeUsed(Box::new(existing)));
            }
        }

        let total_amount = data.ticket_type.price * data.ticket_count as i64;

        let booking = Booking::new(
            NewBookingParams {
                invite_code: code.clone(),
                customer_name: data.customer_name,
                customer_email: data.customer_email,
                customer_phone: data.customer_phone,
                ticket_type: data.ticket_type.id.to_string(),
                ticket_count: data.ticket_count,
                total_amount,
                reference_prefix: catalog::EVENT_REFERENCE_PREFIX.to_string(),
            },
            now,
        );

        let created = self.booking_repo.create(&booking).await?;

        let payment_session = self.gateway.create_order(&GatewayOrderRequest {
            order_id: created.gateway_order_id.clone(),
            amount: created.total_amount,
            currency: catalog::CURRENCY.to_string(),
            customer_name: created.customer_name.clone(),
            customer_email: created.customer_email.clone(),
            customer_phone: created.customer_phone.clone(),
        }).await?;

        info!(
            "Booking {} created for code {} (ref {}, amount {})",
            created.id, code, created.reference_number, created.total_amount
        );

        Ok(CheckoutSession { booking: created, payment_session })
    }

    pub async fn invite_status(&self, raw_code: &str) -> Result<InviteCodeStatus, AppError> {
        let code = lifecycle::normalize_code(raw_code);

        if !self.registry.is_valid(&code).await {
            return Ok(InviteCodeStatus { code, is_valid: false, is_used: false, booking: None });
        }

        let now = self.clock.now();
        match self.booking_repo.find_by_invite_code(&code).await? {
            // An expired pending row reads as unused; it is reclaimed for real
            // on the next create.
            Some(booking) if !lifecycle::is_expired(&booking, now) => Ok(InviteCodeStatus {
                code,
                is_valid: true,
                is_used: true,
                booking: Some(booking),
            }),
            _ => Ok(InviteCodeStatus { code, is_valid: true, is_used: false, booking: None }),
        }
    }
}
