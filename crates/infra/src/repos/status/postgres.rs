use sqlx::PgPool;
use tracing::error;

use super::IStatusRepo;

pub struct PostgresStatusRepo {
    pool: PgPool,
}

impl PostgresStatusRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl IStatusRepo for PostgresStatusRepo {
    async fn check_connection(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .inspect_err(|e| {
                error!(error = ?e, "Database connection check failed");
            })?;
        Ok(())
    }
}
