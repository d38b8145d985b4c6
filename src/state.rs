use std::sync::Arc;
use crate::domain::ports::{
    BookingRepository, Clock, EmailService, JobRepository, SheetSync, WebhookLogRepository,
};
use crate::domain::services::booking_service::BookingService;
use crate::domain::services::invite_registry::InviteRegistry;
use crate::domain::services::reconciliation::ReconciliationService;
use crate::config::Config;
use tera::Tera;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub webhook_repo: Arc<dyn WebhookLogRepository>,
    pub job_repo: Arc<dyn JobRepository>,
    pub email_service: Arc<dyn EmailService>,
    pub sheet_service: Arc<dyn SheetSync>,
    pub invite_registry: Arc<InviteRegistry>,
    pub booking_service: Arc<BookingService>,
    pub reconciliation: Arc<ReconciliationService>,
    pub clock: Arc<dyn Clock>,
    pub templates: Arc<Tera>,
}
