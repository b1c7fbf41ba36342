mod postgres;

use chrono::{DateTime, Utc};
pub use postgres::PostgresWebhookEventRepo;
use soudan_domain::ProviderEventId;

#[async_trait::async_trait]
pub trait IWebhookEventRepo: Send + Sync {
    /// Record a provider event id. Returns false when the id was already
    /// seen, which is how re-delivered events collapse to one effect.
    async fn try_insert(
        &self,
        provider_event_id: &ProviderEventId,
        received_at: DateTime<Utc>,
    ) -> anyhow::Result<bool>;

    /// Forget an event id so a failed delivery can be retried by the
    /// provider's redelivery.
    async fn remove(&self, provider_event_id: &ProviderEventId) -> anyhow::Result<()>;

    /// Drop dedup records older than the retention window.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> anyhow::Result<u64>;
}
