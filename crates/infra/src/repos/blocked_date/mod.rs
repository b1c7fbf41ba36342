mod postgres;

use chrono::NaiveDate;
pub use postgres::PostgresBlockedDateRepo;
use soudan_domain::ExpertId;

#[async_trait::async_trait]
pub trait IBlockedDateRepo: Send + Sync {
    async fn add(&self, expert_id: &ExpertId, date: NaiveDate) -> anyhow::Result<()>;
    async fn remove(&self, expert_id: &ExpertId, date: NaiveDate) -> anyhow::Result<()>;
    /// Blocked dates within `[from, to]`, both bounds inclusive local dates
    async fn list(
        &self,
        expert_id: &ExpertId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<NaiveDate>>;
}
