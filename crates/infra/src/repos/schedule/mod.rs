mod postgres;

pub use postgres::PostgresScheduleRepo;
use soudan_domain::{ExpertId, Schedule};

#[async_trait::async_trait]
pub trait IScheduleRepo: Send + Sync {
    /// Insert or replace the expert's weekly schedule
    async fn save(&self, schedule: &Schedule) -> anyhow::Result<()>;
    async fn find(&self, expert_id: &ExpertId) -> anyhow::Result<Option<Schedule>>;
}
