mod config;
mod repos;
mod services;
mod system;

use std::sync::Arc;

pub use config::{Config, RemindersSettings};
use repos::Repos;
pub use repos::{ConfirmOutcome, ExpertIntegration, HoldOutcome, IntegrationProvider};
pub use services::*;
use sqlx::postgres::PgPoolOptions;
pub use system::ISys;
use system::RealSys;

use crate::google_calendar::TokenProbeCache;

/// The context for the application
/// Contains the repositories, configuration, and system
///
/// System is abstracted to allow for testing
#[derive(Clone)]
pub struct SoudanContext {
    pub repos: Repos,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
    pub token_probe: TokenProbeCache,
}

/// The parameters to create the context
struct ContextParams {
    pub postgres_connection_string: String,
}

impl SoudanContext {
    async fn create(params: ContextParams) -> anyhow::Result<Self> {
        let repos = Repos::create_postgres(&params.postgres_connection_string).await?;
        Ok(Self {
            repos,
            config: Config::new()?,
            sys: Arc::new(RealSys {}),
            token_probe: TokenProbeCache::new(),
        })
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> anyhow::Result<SoudanContext> {
    SoudanContext::create(ContextParams {
        postgres_connection_string: soudan_utils::config::APP_CONFIG.pg.database_url.clone(),
    })
    .await
}

/// Run the migrations
///
/// This is not run by the application itself, but is provided as a utility
/// Usage is in bins/soudan/src/bin/migrate.rs
pub async fn run_migration() -> anyhow::Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(soudan_utils::config::APP_CONFIG.pg.database_url.as_str())
        .await?;

    sqlx::migrate!().run(&pool).await.map_err(|e| e.into())
}
