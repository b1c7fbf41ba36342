mod postgres;

pub use postgres::PostgresExpertRepo;
use soudan_domain::{Expert, ExpertId};

#[async_trait::async_trait]
pub trait IExpertRepo: Send + Sync {
    async fn insert(&self, expert: &Expert) -> anyhow::Result<()>;
    async fn save(&self, expert: &Expert) -> anyhow::Result<()>;
    async fn find(&self, expert_id: &ExpertId) -> anyhow::Result<Option<Expert>>;
    async fn find_by_handle(&self, handle: &str) -> anyhow::Result<Option<Expert>>;
}
