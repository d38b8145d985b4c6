pub mod sqlite_booking_repo;
pub mod sqlite_webhook_repo;
pub mod sqlite_job_repo;

pub mod postgres_booking_repo;
pub mod postgres_webhook_repo;
pub mod postgres_job_repo;
