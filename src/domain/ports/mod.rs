use crate::domain::models::{
    booking::{Booking, PaymentStatus},
    gateway::{GatewayOrderRequest, GatewayOrderSession, GatewayOrderStatus},
    job::Job,
    webhook::ProcessedWebhook,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Booking>, AppError>;
    /// Completed (or refunded) bookings take priority over stale pending ones
    /// for the same code; failed bookings never occupy a code.
    async fn find_by_invite_code(&self, code: &str) -> Result<Option<Booking>, AppError>;
    /// The single mutation point for payment state. Conditional on the row
    /// still being pending; the side-effect jobs are inserted in the same
    /// transaction only when the transition is won. Returns None when another
    /// caller already finalized the booking.
    async fn update_status(
        &self,
        order_id: &str,
        status: PaymentStatus,
        payment_id: Option<String>,
        payment_method: Option<String>,
        now: DateTime<Utc>,
        jobs: Vec<Job>,
    ) -> Result<Option<Booking>, AppError>;
    async fn mark_refunded(&self, id: &str, now: DateTime<Utc>) -> Result<Option<Booking>, AppError>;
    async fn mark_email_sent(&self, id: &str, now: DateTime<Utc>) -> Result<bool, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
    async fn list_all(&self) -> Result<Vec<Booking>, AppError>;
}

#[async_trait]
pub trait WebhookLogRepository: Send + Sync {
    async fn is_processed(&self, idempotency_key: &str) -> Result<bool, AppError>;
    async fn record(&self, entry: &ProcessedWebhook) -> Result<(), AppError>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create(&self, job: &Job) -> Result<Job, AppError>;
    async fn find_pending(&self, limit: i32) -> Result<Vec<Job>, AppError>;
    async fn update_status(&self, id: &str, status: &str, error_message: Option<String>) -> Result<(), AppError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<GatewayOrderSession, AppError>;
    async fn order_status(&self, order_id: &str) -> Result<GatewayOrderStatus, AppError>;
}

#[async_trait]
pub trait InviteSource: Send + Sync {
    async fn fetch_codes(&self) -> Result<Vec<String>, AppError>;
}

#[async_trait]
pub trait SheetSync: Send + Sync {
    async fn upsert_booking_row(&self, booking: &Booking) -> Result<(), AppError>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
