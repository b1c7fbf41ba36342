use chrono::NaiveDate;
use soudan_domain::ExpertId;
use sqlx::{FromRow, PgPool};
use tracing::{error, instrument};

use super::IBlockedDateRepo;

#[derive(Debug)]
pub struct PostgresBlockedDateRepo {
    pool: PgPool,
}

impl PostgresBlockedDateRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct BlockedDateRaw {
    blocked_date: NaiveDate,
}

#[async_trait::async_trait]
impl IBlockedDateRepo for PostgresBlockedDateRepo {
    #[instrument(name = "blocked_date::add", skip(self))]
    async fn add(&self, expert_id: &ExpertId, date: NaiveDate) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO blocked_dates(expert_uid, blocked_date)
            VALUES($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(expert_id.as_ref())
        .bind(date)
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                expert_id = %expert_id,
                %date,
                error = ?e,
                "Failed to add blocked date"
            );
        })?;
        Ok(())
    }

    #[instrument(name = "blocked_date::remove", skip(self))]
    async fn remove(&self, expert_id: &ExpertId, date: NaiveDate) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            DELETE FROM blocked_dates
            WHERE expert_uid = $1 AND blocked_date = $2
            "#,
        )
        .bind(expert_id.as_ref())
        .bind(date)
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                expert_id = %expert_id,
                %date,
                error = ?e,
                "Failed to remove blocked date"
            );
        })?;
        Ok(())
    }

    #[instrument(name = "blocked_date::list", skip(self))]
    async fn list(
        &self,
        expert_id: &ExpertId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<NaiveDate>> {
        let rows = sqlx::query_as::<_, BlockedDateRaw>(
            r#"
            SELECT b.blocked_date FROM blocked_dates AS b
            WHERE b.expert_uid = $1 AND b.blocked_date BETWEEN $2 AND $3
            ORDER BY b.blocked_date
            "#,
        )
        .bind(expert_id.as_ref())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                expert_id = %expert_id,
                error = ?e,
                "Failed to list blocked dates"
            );
        })?;

        Ok(rows.into_iter().map(|r| r.blocked_date).collect())
    }
}
