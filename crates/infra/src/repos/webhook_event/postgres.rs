use chrono::{DateTime, Utc};
use soudan_domain::ProviderEventId;
use sqlx::PgPool;
use tracing::{error, instrument};

use super::IWebhookEventRepo;

pub struct PostgresWebhookEventRepo {
    pool: PgPool,
}

impl PostgresWebhookEventRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl IWebhookEventRepo for PostgresWebhookEventRepo {
    #[instrument(name = "webhook_event::try_insert", skip(self))]
    async fn try_insert(
        &self,
        provider_event_id: &ProviderEventId,
        received_at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO webhook_events(provider_event_id, received_at)
            VALUES($1, $2)
            ON CONFLICT(provider_event_id) DO NOTHING
            "#,
        )
        .bind(provider_event_id.as_str())
        .bind(received_at)
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                provider_event_id = %provider_event_id,
                error = ?e,
                "Failed to record webhook event"
            );
        })?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(name = "webhook_event::remove", skip(self))]
    async fn remove(&self, provider_event_id: &ProviderEventId) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            DELETE FROM webhook_events
            WHERE provider_event_id = $1
            "#,
        )
        .bind(provider_event_id.as_str())
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                provider_event_id = %provider_event_id,
                error = ?e,
                "Failed to remove webhook event"
            );
        })?;
        Ok(())
    }

    #[instrument(name = "webhook_event::purge_older_than", skip(self))]
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM webhook_events
            WHERE received_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            error!(error = ?e, "Failed to purge webhook events");
        })?;
        Ok(result.rows_affected())
    }
}
