mod blocked_date;
mod event;
mod expert;
mod expert_integration;
mod meeting;
mod reservation;
mod schedule;
mod status;
mod transfer;
mod webhook_event;

use std::sync::Arc;

use anyhow::Context;
use blocked_date::{IBlockedDateRepo, PostgresBlockedDateRepo};
use event::{IEventRepo, PostgresEventRepo};
use expert::{IExpertRepo, PostgresExpertRepo};
pub use expert_integration::{ExpertIntegration, IntegrationProvider};
use expert_integration::{IExpertIntegrationRepo, PostgresExpertIntegrationRepo};
use meeting::{IMeetingRepo, PostgresMeetingRepo};
pub use reservation::{ConfirmOutcome, HoldOutcome};
use reservation::{IReservationRepo, PostgresReservationRepo};
use schedule::{IScheduleRepo, PostgresScheduleRepo};
use sqlx::{migrate::MigrateError, postgres::PgPoolOptions};
use status::{IStatusRepo, PostgresStatusRepo};
use tracing::{error, info};
use transfer::{ITransferRepo, PostgresTransferRepo};
use webhook_event::{IWebhookEventRepo, PostgresWebhookEventRepo};

#[derive(Clone)]
pub struct Repos {
    pub experts: Arc<dyn IExpertRepo>,
    pub expert_integrations: Arc<dyn IExpertIntegrationRepo>,
    pub schedules: Arc<dyn IScheduleRepo>,
    pub blocked_dates: Arc<dyn IBlockedDateRepo>,
    pub events: Arc<dyn IEventRepo>,
    pub reservations: Arc<dyn IReservationRepo>,
    pub meetings: Arc<dyn IMeetingRepo>,
    pub transfers: Arc<dyn ITransferRepo>,
    pub webhook_events: Arc<dyn IWebhookEventRepo>,
    pub status: Arc<dyn IStatusRepo>,
}

impl Repos {
    pub async fn create_postgres(connection_string: &str) -> anyhow::Result<Self> {
        info!("DB CHECKING CONNECTION ...");
        let pool = PgPoolOptions::new()
            .max_connections(soudan_utils::config::APP_CONFIG.pg.max_connections)
            .connect(connection_string)
            .await
            .context(format!(
                "Failed to connect to PG url '{}'",
                remove_password_from_url(connection_string)?
            ))?;
        info!("DB CHECKING CONNECTION ... [done]");

        if !soudan_utils::config::APP_CONFIG.pg.skip_migrations {
            info!("DB EXECUTING MIGRATION ...");

            let migration_result = sqlx::migrate!().run(&pool).await;

            // A migration applied by a newer deployment but missing in this
            // build must not break the older deployment when it restarts
            if let Err(e) = migration_result {
                if let MigrateError::VersionMissing(_) = e {
                    error!("Failed to run migration: {}", e);
                } else {
                    return Err(e.into());
                }
            }
            info!("DB EXECUTING MIGRATION ... [done]");
        } else {
            info!("DB MIGRATION SKIPPED");
        }

        Ok(Self {
            experts: Arc::new(PostgresExpertRepo::new(pool.clone())),
            expert_integrations: Arc::new(PostgresExpertIntegrationRepo::new(pool.clone())),
            schedules: Arc::new(PostgresScheduleRepo::new(pool.clone())),
            blocked_dates: Arc::new(PostgresBlockedDateRepo::new(pool.clone())),
            events: Arc::new(PostgresEventRepo::new(pool.clone())),
            reservations: Arc::new(PostgresReservationRepo::new(pool.clone())),
            meetings: Arc::new(PostgresMeetingRepo::new(pool.clone())),
            transfers: Arc::new(PostgresTransferRepo::new(pool.clone())),
            webhook_events: Arc::new(PostgresWebhookEventRepo::new(pool.clone())),
            status: Arc::new(PostgresStatusRepo::new(pool)),
        })
    }
}

fn remove_password_from_url(connection_string: &str) -> anyhow::Result<String> {
    let mut url = match url::Url::parse(connection_string) {
        Ok(url) => url,
        // If the connection string is not a valid URL, return it as is
        Err(_) => return Ok(connection_string.to_string()),
    };
    if url.password().is_some() {
        url.set_password(Some("*********"))
            .map_err(|_| anyhow::anyhow!("Failed to mask password in connection string"))?;
    }
    Ok(url.to_string())
}
