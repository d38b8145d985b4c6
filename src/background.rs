use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, info_span, Instrument};

use crate::domain::models::booking::Booking;
use crate::domain::models::job::{Job, JOB_FAILURE_EMAIL, JOB_SHEET_SYNC, JOB_TICKET_EMAIL};
use crate::domain::services::catalog;
use crate::error::AppError;
use crate::state::AppState;

pub async fn start_background_worker(state: Arc<AppState>) {
    info!("Starting side-effect job worker...");

    loop {
        run_pending_jobs(&state).await;
        sleep(Duration::from_secs(5)).await;
    }
}

pub async fn run_pending_jobs(state: &Arc<AppState>) {
    match state.job_repo.find_pending(10).await {
        Ok(jobs) => {
            for job in jobs {
                let span = info_span!(
                    "side_effect_job",
                    job_id = %job.id,
                    job_type = %job.job_type,
                    booking_id = %job.payload.booking_id
                );

                let state = state.clone();

                async move {
                    info!("Processing job: {}", job.job_type);
                    match process_job(&state, &job).await {
                        Ok(_) => {
                            info!("Job completed successfully");
                            if let Err(e) = state.job_repo.update_status(&job.id, "COMPLETED", None).await {
                                error!("Failed to mark job as completed: {:?}", e);
                            }
                        }
                        Err(e) => {
                            let err_msg = format!("{}", e);
                            error!("Job failed with error: {}", err_msg);
                            if let Err(up_err) = state.job_repo.update_status(&job.id, "FAILED", Some(err_msg)).await {
                                error!("Failed to mark job as failed: {:?}", up_err);
                            }
                        }
                    }
                }
                    .instrument(span)
                    .await;
            }
        }
        Err(e) => error!("Failed to fetch pending jobs: {:?}", e),
    }
}

async fn process_job(state: &Arc<AppState>, job: &Job) -> Result<(), AppError> {
    // Always re-read the booking: the idempotency flag must come from
    // storage, never from whatever snapshot enqueued the job.
    let booking = state.booking_repo.find_by_id(&job.payload.booking_id).await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", job.payload.booking_id)))?;

    match job.job_type.as_str() {
        JOB_TICKET_EMAIL => send_ticket_email(state, booking).await,
        JOB_SHEET_SYNC => state.sheet_service.upsert_booking_row(&booking).await,
        JOB_FAILURE_EMAIL => send_failure_email(state, booking).await,
        other => Err(AppError::InternalWithMsg(format!("Unknown job type: {}", other))),
    }
}

fn email_context(booking: &Booking) -> tera::Context {
    let ticket_label = catalog::find_ticket_type(&booking.ticket_type)
        .map(|t| t.label)
        .unwrap_or(booking.ticket_type.as_str());

    let mut context = tera::Context::new();
    context.insert("customer_name", &booking.customer_name);
    context.insert("event_name", catalog::EVENT_NAME);
    context.insert("reference_number", &booking.reference_number);
    context.insert("ticket_label", ticket_label);
    context.insert("ticket_count", &booking.ticket_count);
    context.insert("total_amount", &booking.total_amount);
    context
}

async fn send_ticket_email(state: &Arc<AppState>, booking: Booking) -> Result<(), AppError> {
    if booking.email_sent {
        info!("Ticket email for booking {} skipped (already sent)", booking.id);
        return Ok(());
    }

    let context = email_context(&booking);

    let html = state.templates.render("ticket_confirmation.html", &context)
        .map_err(|e| AppError::InternalWithMsg(format!("Ticket template render error: {:?}", e)))?;
    let subject = tera::Tera::one_off(catalog::TICKET_EMAIL_SUBJECT, &context, false)
        .map_err(|e| AppError::InternalWithMsg(format!("Ticket subject render error: {:?}", e)))?;

    state.email_service.send(&booking.customer_email, &subject, &html).await?;

    // Flag flips only after a successful send: a crash in between costs a
    // duplicate email, never a lost ticket.
    state.booking_repo.mark_email_sent(&booking.id, state.clock.now()).await?;

    info!("Ticket email sent for booking {} ({})", booking.id, booking.reference_number);
    Ok(())
}

async fn send_failure_email(state: &Arc<AppState>, booking: Booking) -> Result<(), AppError> {
    let context = email_context(&booking);

    let html = state.templates.render("payment_failed.html", &context)
        .map_err(|e| AppError::InternalWithMsg(format!("Failure template render error: {:?}", e)))?;
    let subject = tera::Tera::one_off(catalog::FAILURE_EMAIL_SUBJECT, &context, false)
        .map_err(|e| AppError::InternalWithMsg(format!("Failure subject render error: {:?}", e)))?;

    state.email_service.send(&booking.customer_email, &subject, &html).await?;

    info!("Payment-failed notice sent for booking {}", booking.id);
    Ok(())
}
