mod postgres;

pub use postgres::PostgresStatusRepo;

#[async_trait::async_trait]
pub trait IStatusRepo: Send + Sync {
    async fn check_connection(&self) -> anyhow::Result<()>;
}
