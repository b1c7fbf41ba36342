use std::time::Duration;

use chrono::Duration as ChronoDuration;
use serde::Serialize;
use soudan_infra::SoudanContext;
use tokio::time::interval;
use tracing::{error, info};

use crate::{
    payout::SweepTransfersUseCase,
    reservation::SweepReservationsUseCase,
    shared::usecase::execute,
    webhook::signature::sign_envelope,
};

/// Start the periodic reservation expiry sweep
pub fn start_reservation_sweep_job(ctx: SoudanContext) {
    let cadence = ctx.config.sweep_reservations_interval_secs;
    tokio::spawn(async move {
        let mut interval = interval(Duration::from_secs(cadence));
        loop {
            interval.tick().await;

            let usecase = SweepReservationsUseCase {
                now: ctx.sys.get_timestamp(),
            };
            match execute(usecase, &ctx).await {
                Ok(outcome) if outcome.processed > 0 => {
                    info!(
                        processed = outcome.processed,
                        failures = outcome.failures,
                        "Reservation sweep finished"
                    );
                }
                Ok(_) => {}
                Err(e) => error!(error = ?e, "Reservation sweep failed"),
            }
        }
    });
}

/// Start the periodic transfer disbursement sweep, which also prunes old
/// webhook dedup records past the retention window
pub fn start_transfer_sweep_job(ctx: SoudanContext) {
    let cadence = ctx.config.sweep_transfers_interval_secs;
    tokio::spawn(async move {
        let mut interval = interval(Duration::from_secs(cadence));
        loop {
            interval.tick().await;

            let now = ctx.sys.get_timestamp();
            let usecase = SweepTransfersUseCase { now };
            match execute(usecase, &ctx).await {
                Ok(outcome) if outcome.processed > 0 || outcome.failures > 0 => {
                    info!(
                        processed = outcome.processed,
                        failures = outcome.failures,
                        "Transfer sweep finished"
                    );
                }
                Ok(_) => {}
                Err(e) => error!(error = ?e, "Transfer sweep failed"),
            }

            let cutoff = now - ChronoDuration::hours(ctx.config.webhook_retention_hours);
            if let Err(e) = ctx.repos.webhook_events.purge_older_than(cutoff).await {
                error!(error = ?e, "Webhook dedup purge failed");
            }
        }
    });
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MeetingReminderDTO {
    meeting_id: String,
    expert_id: String,
    guest_identifier: String,
    start_time: chrono::DateTime<chrono::Utc>,
    location_handle: String,
}

/// Start the periodic reminder emitter. Each tick collects the live
/// meetings whose start falls one lead window ahead and posts them, signed,
/// to the configured notification webhook.
pub fn start_reminders_job(ctx: SoudanContext) {
    let Some(reminders) = ctx.config.reminders.clone() else {
        info!("No reminder webhook configured, reminder job not started");
        return;
    };
    let cadence = ctx.config.reminders_interval_secs;

    tokio::spawn(async move {
        let client = reqwest::Client::new();
        let mut interval = interval(Duration::from_secs(cadence));
        loop {
            interval.tick().await;

            let now = ctx.sys.get_timestamp();
            let from = now + ChronoDuration::minutes(reminders.lead_minutes);
            let to = from + ChronoDuration::seconds(cadence as i64);

            let upcoming = match ctx.repos.meetings.find_starting_between(from, to).await {
                Ok(meetings) => meetings,
                Err(e) => {
                    error!(error = ?e, "Failed to collect upcoming meetings");
                    continue;
                }
            };
            if upcoming.is_empty() {
                continue;
            }

            let payload = upcoming
                .into_iter()
                .map(|m| MeetingReminderDTO {
                    meeting_id: m.id.to_string(),
                    expert_id: m.expert_id.to_string(),
                    guest_identifier: m.guest.to_string(),
                    start_time: m.start_time,
                    location_handle: m.location_handle,
                })
                .collect::<Vec<_>>();

            let body = match serde_json::to_vec(&payload) {
                Ok(body) => body,
                Err(e) => {
                    error!(error = ?e, "Failed to serialize reminders");
                    continue;
                }
            };
            let envelope = sign_envelope(
                &body,
                &ctx.config.signing_key_current,
                now.timestamp(),
            );

            if let Err(e) = client
                .post(&reminders.webhook_url)
                .header("soudan-signature", envelope)
                .header("content-type", "application/json")
                .body(body)
                .send()
                .await
            {
                error!(error = ?e, "Error delivering reminders to webhook");
            }
        }
    });
}
