use soudan::telemetry::init_subscriber;
use soudan_api::Application;
use soudan_infra::setup_context;
use tokio::signal;
use tracing::{error, info};

/// Exit codes of the server binary:
/// 0 on a clean shutdown, 1 when the configuration is invalid,
/// 2 when an external dependency (Postgres) is unreachable.
fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    if let Err(e) = init_subscriber() {
        // Logging is not up; this is the one place stderr is written directly
        #[allow(clippy::print_stderr)]
        {
            eprintln!("Failed to initialize logging: {e}");
        }
        return 1;
    }

    // Validate the environment configuration before touching anything else
    if let Err(e) = soudan_utils::config::try_parse_config() {
        error!("Invalid configuration: {e}");
        return 1;
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to build the async runtime: {e}");
            return 1;
        }
    };

    match runtime.block_on(async_main()) {
        Ok(()) => 0,
        Err(e) => {
            error!("Fatal: {e:#}");
            2
        }
    }
}

async fn async_main() -> anyhow::Result<()> {
    let context = setup_context().await?;
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let app = Application::new(context).await?;

    // Listen for SIGINT (Ctrl+C) to shutdown the service
    // This sends a message on the channel to shutdown the server gracefully
    // It then waits for the server to finish processing the current requests
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            error!("[main] Failed to listen for SIGINT: {}", e);
        }
        info!("[shutdown] Received SIGINT, sending event on channel...");
        let sleep = soudan_utils::config::APP_CONFIG.server_shutdown_sleep;
        tokio::time::sleep(std::time::Duration::from_secs(sleep)).await;
        let _ = tx.send(());
    });

    // Start the application and block until it finishes
    app.start(rx).await?;

    info!("[shutdown] shutdown complete");

    Ok(())
}
