use crate::domain::{models::{booking::{Booking, PaymentStatus}, job::Job}, ports::BookingRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;
use chrono::{DateTime, Utc};

pub struct PostgresBookingRepo {
    pool: PgPool,
}

impl PostgresBookingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepo {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError> {
        sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, invite_code, customer_name, customer_email, customer_phone, ticket_type, ticket_count, total_amount, payment_status, payment_method, gateway_order_id, gateway_payment_id, reference_number, email_sent, checked_in, created_at, updated_at, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
             RETURNING *"
        )
            .bind(&booking.id).bind(&booking.invite_code).bind(&booking.customer_name).bind(&booking.customer_email)
            .bind(&booking.customer_phone).bind(&booking.ticket_type).bind(booking.ticket_count).bind(booking.total_amount)
            .bind(booking.payment_status).bind(&booking.payment_method).bind(&booking.gateway_order_id).bind(&booking.gateway_payment_id)
            .bind(&booking.reference_number).bind(booking.email_sent).bind(booking.checked_in)
            .bind(booking.created_at).bind(booking.updated_at).bind(booking.expires_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE gateway_order_id = $1")
            .bind(order_id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_invite_code(&self, code: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings
             WHERE invite_code = $1 AND payment_status IN ('pending', 'completed', 'refunded')
             ORDER BY CASE WHEN payment_status = 'pending' THEN 1 ELSE 0 END, created_at DESC
             LIMIT 1"
        )
            .bind(code).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_status(
        &self,
        order_id: &str,
        status: PaymentStatus,
        payment_id: Option<String>,
        payment_method: Option<String>,
        now: DateTime<Utc>,
        jobs: Vec<Job>,
    ) -> Result<Option<Booking>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let updated = sqlx::query_as::<_, Booking>(
            "UPDATE bookings
             SET payment_status = $1,
                 gateway_payment_id = COALESCE(gateway_payment_id, $2),
                 payment_method = COALESCE(payment_method, $3),
                 updated_at = $4
             WHERE gateway_order_id = $5 AND payment_status = 'pending'
             RETURNING *"
        )
            .bind(status).bind(&payment_id).bind(&payment_method).bind(now).bind(order_id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?;

        if updated.is_some() {
            for job in &jobs {
                sqlx::query("INSERT INTO jobs (id, job_type, payload, execute_at, status, error_message, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)")
                    .bind(&job.id).bind(&job.job_type).bind(&job.payload).bind(job.execute_at)
                    .bind(&job.status).bind(&job.error_message).bind(job.created_at)
                    .execute(&mut *tx).await.map_err(AppError::Database)?;
            }
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(updated)
    }

    async fn mark_refunded(&self, id: &str, now: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET payment_status = 'refunded', updated_at = $1
             WHERE id = $2 AND payment_status = 'completed'
             RETURNING *"
        )
            .bind(now).bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn mark_email_sent(&self, id: &str, now: DateTime<Utc>) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE bookings SET email_sent = $1, updated_at = $2 WHERE id = $3 AND email_sent = $4")
            .bind(true).bind(now).bind(id).bind(false)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Booking not found".into()));
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings ORDER BY created_at DESC")
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
