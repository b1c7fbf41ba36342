mod postgres;

pub use postgres::PostgresEventRepo;
use soudan_domain::{Event, EventId, ExpertId};

#[async_trait::async_trait]
pub trait IEventRepo: Send + Sync {
    async fn insert(&self, event: &Event) -> anyhow::Result<()>;
    async fn save(&self, event: &Event) -> anyhow::Result<()>;
    async fn find(&self, event_id: &EventId) -> anyhow::Result<Option<Event>>;
    async fn find_by_slug(
        &self,
        expert_id: &ExpertId,
        slug: &str,
    ) -> anyhow::Result<Option<Event>>;
    async fn find_by_expert(
        &self,
        expert_id: &ExpertId,
        only_active: bool,
    ) -> anyhow::Result<Vec<Event>>;
}
