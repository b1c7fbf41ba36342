pub(crate) mod signature;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use soudan_domain::ProviderEventId;
use soudan_infra::{stripe::StripeEvent, SoudanContext};
use tracing::{info, warn};

use self::signature::verify_envelope;
use crate::{
    error::ApiError,
    payment::HandlePaymentEventUseCase,
    shared::usecase::execute,
};

/// Header carrying the payment provider's envelope signature
const PAYMENT_SIGNATURE_HEADER: &str = "stripe-signature";
/// Header carrying our own envelope signature (calendar + cron triggers)
const SOUDAN_SIGNATURE_HEADER: &str = "soudan-signature";
/// Shared-secret alternative for cron triggers
const CRON_KEY_HEADER: &str = "x-soudan-cron-key";

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    received: bool,
}

fn accepted_keys(ctx: &SoudanContext) -> Vec<&str> {
    let mut keys = vec![ctx.config.signing_key_current.as_str()];
    if let Some(next) = &ctx.config.signing_key_next {
        keys.push(next.as_str());
    }
    keys
}

fn verify_signed(
    ctx: &SoudanContext,
    headers: &HeaderMap,
    header_name: &str,
    body: &[u8],
) -> Result<(), ApiError> {
    let header = headers
        .get(header_name)
        .and_then(|v| v.to_str().ok());
    let now_unix = ctx.sys.get_timestamp().timestamp();

    verify_envelope(body, header, &accepted_keys(ctx), now_unix).map_err(|e| {
        // Never retried; logged for the audit trail
        warn!(header = header_name, error = %e, "Rejected inbound delivery signature");
        ApiError::Unauthorized("Invalid signature".into())
    })
}

/// Cron triggers carry either the shared-secret header or a full envelope.
pub(crate) fn verify_cron_auth(
    ctx: &SoudanContext,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), ApiError> {
    if let Some(key) = headers.get(CRON_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        if accepted_keys(ctx).contains(&key) {
            return Ok(());
        }
        warn!("Rejected cron trigger with wrong shared secret");
        return Err(ApiError::Unauthorized("Invalid cron key".into()));
    }
    verify_signed(ctx, headers, SOUDAN_SIGNATURE_HEADER, body)
}

/// Inbound payment provider events. Acknowledged once the event is
/// persisted; effects run inline but a mid-flight failure answers 503 and
/// relies on the provider's redelivery.
pub async fn payment_webhook_controller(
    State(ctx): State<SoudanContext>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    verify_signed(&ctx, &headers, PAYMENT_SIGNATURE_HEADER, &body)?;

    let event: StripeEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadClientData(format!("Unparseable provider event: {e}")))?;

    let usecase = HandlePaymentEventUseCase {
        event,
        now: ctx.sys.get_timestamp(),
    };

    execute(usecase, &ctx)
        .await
        .map(|effect| {
            info!(effect = ?effect, "Payment event processed");
            Json(WebhookAck { received: true })
        })
        .map_err(|_| ApiError::UpstreamUnavailable("Event processing failed, retry".into()))
}

/// Inbound calendar identity events. The profile updater living outside
/// this core consumes them; here they are authenticated, deduplicated and
/// acknowledged.
pub async fn calendar_webhook_controller(
    State(ctx): State<SoudanContext>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    verify_signed(&ctx, &headers, SOUDAN_SIGNATURE_HEADER, &body)?;

    let event_id = serde_json::from_slice::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(String::from));

    if let Some(event_id) = event_id {
        let first = ctx
            .repos
            .webhook_events
            .try_insert(&ProviderEventId::new(event_id), ctx.sys.get_timestamp())
            .await
            .map_err(|_| ApiError::UpstreamUnavailable("Event persistence failed".into()))?;
        if first {
            info!("Calendar identity event recorded");
        }
    }

    Ok(StatusCode::OK)
}
