use soudan_domain::ExpertId;
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::{error, instrument};

use super::{ExpertIntegration, IExpertIntegrationRepo, IntegrationProvider};

pub struct PostgresExpertIntegrationRepo {
    pool: PgPool,
}

impl PostgresExpertIntegrationRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct IntegrationRaw {
    expert_uid: Uuid,
    provider: String,
    access_token: String,
    refresh_token: String,
    access_token_expires_ts: i64,
}

impl TryFrom<IntegrationRaw> for ExpertIntegration {
    type Error = anyhow::Error;

    fn try_from(i: IntegrationRaw) -> anyhow::Result<Self> {
        let provider = IntegrationProvider::from_db(&i.provider)
            .ok_or_else(|| anyhow::anyhow!("Unknown integration provider in database: {}", i.provider))?;
        Ok(Self {
            expert_id: i.expert_uid.into(),
            provider,
            access_token: i.access_token,
            refresh_token: i.refresh_token,
            access_token_expires_ts: i.access_token_expires_ts,
        })
    }
}

#[async_trait::async_trait]
impl IExpertIntegrationRepo for PostgresExpertIntegrationRepo {
    #[instrument(name = "expert_integration::insert", skip(self, integration), fields(expert_id = %integration.expert_id))]
    async fn insert(&self, integration: &ExpertIntegration) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO expert_integrations(expert_uid, provider, access_token, refresh_token, access_token_expires_ts)
            VALUES($1, $2, $3, $4, $5)
            "#,
        )
        .bind(integration.expert_id.as_ref())
        .bind(integration.provider.as_str())
        .bind(&integration.access_token)
        .bind(&integration.refresh_token)
        .bind(integration.access_token_expires_ts)
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                expert_id = %integration.expert_id,
                error = ?e,
                "Failed to insert expert integration"
            );
        })?;
        Ok(())
    }

    #[instrument(name = "expert_integration::save", skip(self, integration), fields(expert_id = %integration.expert_id))]
    async fn save(&self, integration: &ExpertIntegration) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE expert_integrations
            SET access_token = $3,
                refresh_token = $4,
                access_token_expires_ts = $5
            WHERE expert_uid = $1 AND provider = $2
            "#,
        )
        .bind(integration.expert_id.as_ref())
        .bind(integration.provider.as_str())
        .bind(&integration.access_token)
        .bind(&integration.refresh_token)
        .bind(integration.access_token_expires_ts)
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                expert_id = %integration.expert_id,
                error = ?e,
                "Failed to save expert integration"
            );
        })?;
        Ok(())
    }

    #[instrument(name = "expert_integration::find", skip(self))]
    async fn find(
        &self,
        expert_id: &ExpertId,
        provider: IntegrationProvider,
    ) -> anyhow::Result<Option<ExpertIntegration>> {
        sqlx::query_as::<_, IntegrationRaw>(
            r#"
            SELECT i.* FROM expert_integrations AS i
            WHERE i.expert_uid = $1 AND i.provider = $2
            "#,
        )
        .bind(expert_id.as_ref())
        .bind(provider.as_str())
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                expert_id = %expert_id,
                error = ?e,
                "Failed to find expert integration"
            );
        })?
        .map(ExpertIntegration::try_from)
        .transpose()
    }

    #[instrument(name = "expert_integration::delete", skip(self))]
    async fn delete(
        &self,
        expert_id: &ExpertId,
        provider: IntegrationProvider,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            DELETE FROM expert_integrations
            WHERE expert_uid = $1 AND provider = $2
            "#,
        )
        .bind(expert_id.as_ref())
        .bind(provider.as_str())
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                expert_id = %expert_id,
                error = ?e,
                "Failed to delete expert integration"
            );
        })?;
        Ok(())
    }
}
