mod postgres;

pub use postgres::PostgresExpertIntegrationRepo;
use serde::{Deserialize, Serialize};
use soudan_domain::ExpertId;

/// External providers an expert can connect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IntegrationProvider {
    Google,
}

impl IntegrationProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "google" => Some(Self::Google),
            _ => None,
        }
    }
}

/// OAuth tokens of one expert/provider connection
#[derive(Debug, Clone)]
pub struct ExpertIntegration {
    pub expert_id: ExpertId,
    pub provider: IntegrationProvider,
    pub access_token: String,
    pub refresh_token: String,
    /// Unix millis at which the access token stops being valid
    pub access_token_expires_ts: i64,
}

#[async_trait::async_trait]
pub trait IExpertIntegrationRepo: Send + Sync {
    async fn insert(&self, integration: &ExpertIntegration) -> anyhow::Result<()>;
    async fn save(&self, integration: &ExpertIntegration) -> anyhow::Result<()>;
    async fn find(
        &self,
        expert_id: &ExpertId,
        provider: IntegrationProvider,
    ) -> anyhow::Result<Option<ExpertIntegration>>;
    async fn delete(
        &self,
        expert_id: &ExpertId,
        provider: IntegrationProvider,
    ) -> anyhow::Result<()>;
}
