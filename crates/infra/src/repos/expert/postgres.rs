use std::convert::TryFrom;

use serde_json::Value;
use soudan_domain::{CountryCode, Expert, ExpertId, OnboardingState, PayoutAccountId};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::{error, instrument};

use super::IExpertRepo;

#[derive(Debug)]
pub struct PostgresExpertRepo {
    pool: PgPool,
}

impl PostgresExpertRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ExpertRaw {
    expert_uid: Uuid,
    handle: String,
    timezone: String,
    country: String,
    payout_account_id: Option<String>,
    onboarding_state: String,
    policy_overrides: Value,
}

fn onboarding_state_to_db(state: OnboardingState) -> &'static str {
    match state {
        OnboardingState::Pending => "pending",
        OnboardingState::Active => "active",
        OnboardingState::Deactivated => "deactivated",
    }
}

impl TryFrom<ExpertRaw> for Expert {
    type Error = anyhow::Error;

    fn try_from(e: ExpertRaw) -> anyhow::Result<Self> {
        let onboarding_state = match e.onboarding_state.as_str() {
            "pending" => OnboardingState::Pending,
            "active" => OnboardingState::Active,
            "deactivated" => OnboardingState::Deactivated,
            other => anyhow::bail!("Unknown onboarding state in database: {other}"),
        };
        Ok(Self {
            id: e.expert_uid.into(),
            handle: e.handle,
            timezone: e
                .timezone
                .parse()
                .map_err(|tz| anyhow::anyhow!("Invalid expert timezone in database: {tz}"))?,
            country: CountryCode::new(&e.country)?,
            payout_account_id: e.payout_account_id.map(PayoutAccountId::new),
            onboarding_state,
            policy_overrides: serde_json::from_value(e.policy_overrides)?,
        })
    }
}

#[async_trait::async_trait]
impl IExpertRepo for PostgresExpertRepo {
    #[instrument(name = "expert::insert", skip(self, expert), fields(expert_id = %expert.id))]
    async fn insert(&self, expert: &Expert) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO experts(expert_uid, handle, timezone, country, payout_account_id, onboarding_state, policy_overrides)
            VALUES($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(expert.id.as_ref())
        .bind(&expert.handle)
        .bind(expert.timezone.to_string())
        .bind(expert.country.as_str())
        .bind(expert.payout_account_id.as_ref().map(|a| a.as_str()))
        .bind(onboarding_state_to_db(expert.onboarding_state))
        .bind(serde_json::to_value(expert.policy_overrides)?)
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                expert_id = %expert.id,
                error = ?e,
                "Failed to insert expert"
            );
        })?;

        Ok(())
    }

    #[instrument(name = "expert::save", skip(self, expert), fields(expert_id = %expert.id))]
    async fn save(&self, expert: &Expert) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE experts
            SET handle = $2,
                timezone = $3,
                country = $4,
                payout_account_id = $5,
                onboarding_state = $6,
                policy_overrides = $7
            WHERE expert_uid = $1
            "#,
        )
        .bind(expert.id.as_ref())
        .bind(&expert.handle)
        .bind(expert.timezone.to_string())
        .bind(expert.country.as_str())
        .bind(expert.payout_account_id.as_ref().map(|a| a.as_str()))
        .bind(onboarding_state_to_db(expert.onboarding_state))
        .bind(serde_json::to_value(expert.policy_overrides)?)
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                expert_id = %expert.id,
                error = ?e,
                "Failed to save expert"
            );
        })?;
        Ok(())
    }

    #[instrument(name = "expert::find", skip(self))]
    async fn find(&self, expert_id: &ExpertId) -> anyhow::Result<Option<Expert>> {
        sqlx::query_as::<_, ExpertRaw>(
            r#"
            SELECT e.* FROM experts AS e
            WHERE e.expert_uid = $1
            "#,
        )
        .bind(expert_id.as_ref())
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                expert_id = %expert_id,
                error = ?e,
                "Failed to find expert"
            );
        })?
        .map(Expert::try_from)
        .transpose()
    }

    #[instrument(name = "expert::find_by_handle", skip(self))]
    async fn find_by_handle(&self, handle: &str) -> anyhow::Result<Option<Expert>> {
        sqlx::query_as::<_, ExpertRaw>(
            r#"
            SELECT e.* FROM experts AS e
            WHERE e.handle = $1
            "#,
        )
        .bind(handle)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                handle,
                error = ?e,
                "Failed to find expert by handle"
            );
        })?
        .map(Expert::try_from)
        .transpose()
    }
}
