mod availability;
mod error;
mod event;
mod expert;
mod job_schedulers;
mod jobs;
mod meeting;
mod payment;
mod payout;
mod reservation;
mod schedule;
mod shared;
mod status;
mod webhook;

use axum::{
    routing::{delete, get, post},
    Router,
};
use job_schedulers::{
    start_reminders_job,
    start_reservation_sweep_job,
    start_transfer_sweep_job,
};
use soudan_infra::SoudanContext;
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::CorsLayer,
    sensitive_headers::SetSensitiveRequestHeadersLayer,
    trace::TraceLayer,
};
use tracing::info;

/// All the routes of the booking and payout core, under `/api/v1`
fn api_routes() -> Router<SoudanContext> {
    Router::new()
        .route(
            "/availability",
            get(availability::get_availability_controller),
        )
        .route("/reservations", post(reservation::hold_reservation_controller))
        .route(
            "/reservations/{reservation_id}",
            get(reservation::get_reservation_controller),
        )
        .route(
            "/reservations/{reservation_id}/abort",
            post(reservation::abort_reservation_controller),
        )
        .route("/meetings", get(meeting::get_meetings_controller))
        .route(
            "/meetings/{meeting_id}/cancel",
            post(meeting::cancel_meeting_controller),
        )
        .route(
            "/experts/{expert_id}/events",
            get(event::get_events_controller),
        )
        .route(
            "/experts/{expert_id}/schedule",
            get(schedule::get_schedule_controller).put(schedule::save_schedule_controller),
        )
        .route(
            "/experts/{expert_id}/blocked-dates",
            get(schedule::list_blocked_dates_controller)
                .post(schedule::add_blocked_date_controller),
        )
        .route(
            "/experts/{expert_id}/blocked-dates/{date}",
            delete(schedule::remove_blocked_date_controller),
        )
        .route(
            "/experts/{expert_id}/integrations/google",
            post(expert::oauth_integration_controller)
                .delete(expert::remove_integration_controller),
        )
        .route(
            "/transfers/{transfer_id}/approve",
            post(payout::approve_transfer_controller),
        )
        .route("/webhooks/payment", post(webhook::payment_webhook_controller))
        .route(
            "/webhooks/calendar",
            post(webhook::calendar_webhook_controller),
        )
        .route(
            "/jobs/sweep-reservations",
            post(jobs::sweep_reservations_controller),
        )
        .route(
            "/jobs/sweep-transfers",
            post(jobs::sweep_transfers_controller),
        )
        .route("/healthcheck", get(status::status_controller))
}

/// Struct for storing the main application state
pub struct Application {
    router: Router,
    listener: TcpListener,
    port: u16,
}

impl Application {
    pub async fn new(context: SoudanContext) -> anyhow::Result<Self> {
        let (router, listener, port) = Application::configure_server(context.clone()).await?;

        Application::start_jobs(context);

        Ok(Self {
            router,
            listener,
            port,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Start the background jobs of the application, unless an external
    /// cron drives the /jobs endpoints instead
    fn start_jobs(context: SoudanContext) {
        if !context.config.disable_internal_jobs {
            start_reservation_sweep_job(context.clone());
            start_transfer_sweep_job(context.clone());
            start_reminders_job(context);
        }
    }

    /// Bind the listener and build the router with its middleware:
    /// - CORS (permissive)
    /// - Compression
    /// - Tracing with authorization redacted
    async fn configure_server(
        context: SoudanContext,
    ) -> anyhow::Result<(Router, TcpListener, u16)> {
        let port = context.config.port;
        let address = soudan_utils::config::APP_CONFIG.http_host.clone();
        let address_and_port = format!("{address}:{port}");
        info!("Starting server on: {}", address_and_port);

        let listener = TcpListener::bind(&address_and_port).await?;
        let port = listener.local_addr()?.port();

        let router = Router::new()
            .nest("/api/v1", api_routes())
            .layer(SetSensitiveRequestHeadersLayer::new([
                axum::http::header::AUTHORIZATION,
            ]))
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive())
            .layer(CatchPanicLayer::new())
            .with_state(context);

        Ok((router, listener, port))
    }

    /// Serve until the shutdown signal fires, then drain
    pub async fn start(
        self,
        shutdown_channel: tokio::sync::oneshot::Receiver<()>,
    ) -> anyhow::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async {
                let _ = shutdown_channel.await;
                info!("Shutdown signal received, draining connections");
            })
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }
}
