use crate::domain::{models::webhook::ProcessedWebhook, ports::WebhookLogRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteWebhookRepo {
    pool: SqlitePool,
}

impl SqliteWebhookRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WebhookLogRepository for SqliteWebhookRepo {
    async fn is_processed(&self, idempotency_key: &str) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM processed_webhooks WHERE idempotency_key = ?)"
        )
            .bind(idempotency_key)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn record(&self, entry: &ProcessedWebhook) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO processed_webhooks (idempotency_key, order_id, tx_status, received_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(idempotency_key) DO NOTHING"
        )
            .bind(&entry.idempotency_key)
            .bind(&entry.order_id)
            .bind(&entry.tx_status)
            .bind(entry.received_at)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}
