//! PostgreSQL implementation of WebhookRepository.
//!
//! Stores every inbound gateway delivery verbatim before processing and
//! records the outcome afterwards. Rows are immutable apart from the
//! processed marker.

use crate::domain::foundation::{Timestamp, WebhookId};
use crate::domain::payments::{PaymentError, PaymentWebhook};
use crate::ports::WebhookRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of the WebhookRepository port.
pub struct PostgresWebhookRepository {
    pool: PgPool,
}

impl PostgresWebhookRepository {
    /// Creates a new PostgresWebhookRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a webhook delivery.
#[derive(Debug, sqlx::FromRow)]
struct WebhookRow {
    id: Uuid,
    provider: String,
    payload: JsonValue,
    signature: Option<String>,
    txnid: Option<String>,
    processed: bool,
    processing_error: Option<String>,
    received_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

impl From<WebhookRow> for PaymentWebhook {
    fn from(row: WebhookRow) -> Self {
        PaymentWebhook {
            id: WebhookId::from_uuid(row.id),
            provider: row.provider,
            payload: row.payload,
            signature: row.signature,
            txnid: row.txnid,
            processed: row.processed,
            processing_error: row.processing_error,
            received_at: Timestamp::from_datetime(row.received_at),
            processed_at: row.processed_at.map(Timestamp::from_datetime),
        }
    }
}

#[async_trait]
impl WebhookRepository for PostgresWebhookRepository {
    async fn record(&self, webhook: &PaymentWebhook) -> Result<(), PaymentError> {
        sqlx::query(
            r#"
            INSERT INTO payment_webhooks (
                id, provider, payload, signature, txnid, processed,
                processing_error, received_at, processed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(webhook.id.as_uuid())
        .bind(&webhook.provider)
        .bind(&webhook.payload)
        .bind(&webhook.signature)
        .bind(&webhook.txnid)
        .bind(webhook.processed)
        .bind(&webhook.processing_error)
        .bind(webhook.received_at.as_datetime())
        .bind(webhook.processed_at.as_ref().map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| PaymentError::infrastructure(format!("Failed to record webhook: {}", e)))?;

        Ok(())
    }

    async fn mark_processed(
        &self,
        id: &WebhookId,
        error: Option<String>,
    ) -> Result<(), PaymentError> {
        let result = sqlx::query(
            r#"
            UPDATE payment_webhooks
            SET processed = TRUE, processing_error = $2, processed_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(error)
        .bind(Timestamp::now().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            PaymentError::infrastructure(format!("Failed to mark webhook processed: {}", e))
        })?;

        if result.rows_affected() == 0 {
            return Err(PaymentError::infrastructure(format!(
                "No webhook record with id {}",
                id
            )));
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &WebhookId) -> Result<Option<PaymentWebhook>, PaymentError> {
        let row: Option<WebhookRow> = sqlx::query_as(
            r#"
            SELECT id, provider, payload, signature, txnid, processed,
                   processing_error, received_at, processed_at
            FROM payment_webhooks
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PaymentError::infrastructure(format!("Failed to find webhook: {}", e)))?;

        Ok(row.map(PaymentWebhook::from))
    }

    async fn purge_processed_before(&self, cutoff: Timestamp) -> Result<u64, PaymentError> {
        let result = sqlx::query(
            "DELETE FROM payment_webhooks WHERE processed AND received_at < $1",
        )
        .bind(cutoff.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| PaymentError::infrastructure(format!("Failed to purge webhooks: {}", e)))?;

        Ok(result.rows_affected())
    }
}
