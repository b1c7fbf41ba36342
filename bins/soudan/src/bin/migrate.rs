use soudan::telemetry::init_subscriber;
use soudan_infra::run_migration;

/// This is a standalone binary that can be run to apply the migrations.
/// Exit codes follow the operational convention: 1 for a configuration
/// problem, 2 when the database is unreachable.
#[tokio::main]
async fn main() {
    std::process::exit(run().await);
}

async fn run() -> i32 {
    if init_subscriber().is_err() {
        return 1;
    }

    if let Err(e) = soudan_utils::config::try_parse_config() {
        tracing::error!("Invalid configuration: {e}");
        return 1;
    }

    match run_migration().await {
        Ok(()) => {
            tracing::info!("Migrations complete");
            0
        }
        Err(e) => {
            tracing::error!(error = ?e, "Failed to run migrations");
            2
        }
    }
}
