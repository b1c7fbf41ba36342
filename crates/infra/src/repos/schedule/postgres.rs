use std::convert::TryFrom;

use serde_json::Value;
use soudan_domain::{ExpertId, Schedule};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::{error, instrument};

use super::IScheduleRepo;

#[derive(Debug)]
pub struct PostgresScheduleRepo {
    pool: PgPool,
}

impl PostgresScheduleRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ScheduleRaw {
    expert_uid: Uuid,
    timezone: String,
    windows: Value,
}

impl TryFrom<ScheduleRaw> for Schedule {
    type Error = anyhow::Error;

    fn try_from(s: ScheduleRaw) -> anyhow::Result<Self> {
        Ok(Self {
            expert_id: s.expert_uid.into(),
            timezone: s
                .timezone
                .parse()
                .map_err(|tz| anyhow::anyhow!("Invalid schedule timezone in database: {tz}"))?,
            windows: serde_json::from_value(s.windows)?,
        })
    }
}

#[async_trait::async_trait]
impl IScheduleRepo for PostgresScheduleRepo {
    #[instrument(name = "schedule::save", skip(self, schedule), fields(expert_id = %schedule.expert_id))]
    async fn save(&self, schedule: &Schedule) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO schedules(expert_uid, timezone, windows)
            VALUES($1, $2, $3)
            ON CONFLICT(expert_uid) DO UPDATE SET timezone = $2, windows = $3
            "#,
        )
        .bind(schedule.expert_id.as_ref())
        .bind(schedule.timezone.to_string())
        .bind(serde_json::to_value(&schedule.windows)?)
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                expert_id = %schedule.expert_id,
                error = ?e,
                "Failed to save schedule"
            );
        })?;
        Ok(())
    }

    #[instrument(name = "schedule::find", skip(self))]
    async fn find(&self, expert_id: &ExpertId) -> anyhow::Result<Option<Schedule>> {
        sqlx::query_as::<_, ScheduleRaw>(
            r#"
            SELECT s.* FROM schedules AS s
            WHERE s.expert_uid = $1
            "#,
        )
        .bind(expert_id.as_ref())
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                expert_id = %expert_id,
                error = ?e,
                "Failed to find schedule"
            );
        })?
        .map(Schedule::try_from)
        .transpose()
    }
}
