use chrono::{DateTime, Duration, Utc};
use soudan_domain::{PaymentId, ProviderEventId, Reservation};
use soudan_infra::{
    stripe::{StripeCheckoutSessionObject, StripeEvent},
    SoudanContext,
};
use tracing::{error, info, warn};

use crate::{
    reservation::{ConfirmEffect, ConfirmReservationUseCase},
    shared::usecase::{execute, UseCase},
};

/// What a provider event did to our state. Re-delivery of the same event id
/// always collapses to `Duplicate` with no further side effects.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum PaymentEventEffect {
    ConfirmedReservation,
    MarkedPendingVoucher,
    AbortedReservation,
    RefundIssued,
    /// Event id seen before
    Duplicate,
    /// Unknown session or irrelevant event type
    Noop,
}

/// How an inbound provider event type maps onto the orchestrator's actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProviderEventKind {
    /// Funds captured, synchronously or after a voucher cleared
    Captured,
    /// Voucher-style payment started; funds arrive days later
    PendingVoucher,
    /// Payment failed or the checkout was abandoned
    Aborted,
    Irrelevant,
}

pub(crate) fn classify_event(event_type: &str, payment_status: Option<&str>) -> ProviderEventKind {
    match event_type {
        "checkout.session.completed" => match payment_status {
            Some("paid") => ProviderEventKind::Captured,
            // Completed checkout with an async method still collecting
            Some("unpaid") => ProviderEventKind::PendingVoucher,
            _ => ProviderEventKind::Irrelevant,
        },
        "checkout.session.async_payment_succeeded" => ProviderEventKind::Captured,
        "checkout.session.async_payment_failed" => ProviderEventKind::Aborted,
        "checkout.session.expired" => ProviderEventKind::Aborted,
        _ => ProviderEventKind::Irrelevant,
    }
}

#[derive(Debug)]
pub(crate) struct HandlePaymentEventUseCase {
    pub event: StripeEvent,
    pub now: DateTime<Utc>,
}

#[derive(Debug)]
pub(crate) enum UseCaseError {
    /// Processing failed midway; the dedup record is released so the
    /// provider's redelivery can retry
    Retryable,
}

#[async_trait::async_trait]
impl UseCase for HandlePaymentEventUseCase {
    type Response = PaymentEventEffect;

    type Error = UseCaseError;

    const NAME: &'static str = "HandlePaymentEvent";

    async fn execute(&mut self, ctx: &SoudanContext) -> Result<Self::Response, Self::Error> {
        let event_id = ProviderEventId::new(self.event.id.clone());

        let first_delivery = ctx
            .repos
            .webhook_events
            .try_insert(&event_id, self.now)
            .await
            .map_err(|_| UseCaseError::Retryable)?;
        if !first_delivery {
            return Ok(PaymentEventEffect::Duplicate);
        }

        let result = self.dispatch(ctx).await;
        if result.is_err() {
            // Give the redelivery a chance to succeed
            if let Err(e) = ctx.repos.webhook_events.remove(&event_id).await {
                error!(
                    provider_event_id = %event_id,
                    error = ?e,
                    "Failed to release dedup record of failed event"
                );
            }
        }
        result
    }
}

impl HandlePaymentEventUseCase {
    async fn dispatch(&self, ctx: &SoudanContext) -> Result<PaymentEventEffect, UseCaseError> {
        let kind = {
            // Peek at the payment status without committing to the full parse
            let status = self
                .event
                .data
                .object
                .get("payment_status")
                .and_then(|s| s.as_str());
            classify_event(&self.event.event_type, status)
        };
        if kind == ProviderEventKind::Irrelevant {
            info!(event_type = %self.event.event_type, "Ignoring provider event");
            return Ok(PaymentEventEffect::Noop);
        }

        let session: StripeCheckoutSessionObject =
            match serde_json::from_value(self.event.data.object.clone()) {
                Ok(session) => session,
                Err(e) => {
                    warn!(
                        event_type = %self.event.event_type,
                        error = ?e,
                        "Provider event carried an unparseable session object"
                    );
                    return Ok(PaymentEventEffect::Noop);
                }
            };

        let Some(reservation) = self.find_reservation(&session, ctx).await? else {
            // UnknownSession: drop
            warn!(session_id = %session.id, "Provider event for unknown session, dropping");
            return Ok(PaymentEventEffect::Noop);
        };

        match kind {
            ProviderEventKind::Captured => self.captured(reservation, session, ctx).await,
            ProviderEventKind::PendingVoucher => {
                let extended = reservation.created_at
                    + Duration::minutes(ctx.config.pending_voucher_grace_minutes);
                ctx.repos
                    .reservations
                    .mark_pending_voucher(&reservation.id, extended)
                    .await
                    .map_err(|_| UseCaseError::Retryable)?;
                info!(
                    reservation_id = %reservation.id,
                    "Voucher payment pending, hold extended"
                );
                Ok(PaymentEventEffect::MarkedPendingVoucher)
            }
            ProviderEventKind::Aborted => {
                ctx.repos
                    .reservations
                    .abort(&reservation.id)
                    .await
                    .map_err(|_| UseCaseError::Retryable)?;
                info!(
                    reservation_id = %reservation.id,
                    event_type = %self.event.event_type,
                    "Hold released after failed or abandoned payment"
                );
                Ok(PaymentEventEffect::AbortedReservation)
            }
            ProviderEventKind::Irrelevant => Ok(PaymentEventEffect::Noop),
        }
    }

    async fn captured(
        &self,
        reservation: Reservation,
        session: StripeCheckoutSessionObject,
        ctx: &SoudanContext,
    ) -> Result<PaymentEventEffect, UseCaseError> {
        // Verify the captured amount against the offering before committing
        let event = ctx
            .repos
            .events
            .find(&reservation.event_id)
            .await
            .map_err(|_| UseCaseError::Retryable)?;
        let expected = event.as_ref().map(|e| e.price_minor);
        if let (Some(expected), Some(actual)) = (expected, session.amount_total) {
            if expected != actual {
                error!(
                    reservation_id = %reservation.id,
                    expected,
                    actual,
                    "Captured amount does not match the offering price, aborting hold"
                );
                ctx.repos
                    .reservations
                    .abort(&reservation.id)
                    .await
                    .map_err(|_| UseCaseError::Retryable)?;
                return Ok(PaymentEventEffect::AbortedReservation);
            }
        }

        let payment_id = PaymentId::new(
            session
                .payment_intent
                .clone()
                .unwrap_or_else(|| session.id.clone()),
        );
        let amount = session.amount_total.unwrap_or_default();
        let currency = session
            .currency
            .clone()
            .unwrap_or_else(|| "eur".to_string())
            .to_uppercase();

        let usecase = ConfirmReservationUseCase {
            reservation,
            payment_id,
            amount_minor: amount,
            currency,
            now: self.now,
        };
        match execute(usecase, ctx).await {
            Ok(ConfirmEffect::MeetingCreated(_)) => Ok(PaymentEventEffect::ConfirmedReservation),
            Ok(ConfirmEffect::RefundIssued) => Ok(PaymentEventEffect::RefundIssued),
            Err(_) => Err(UseCaseError::Retryable),
        }
    }

    async fn find_reservation(
        &self,
        session: &StripeCheckoutSessionObject,
        ctx: &SoudanContext,
    ) -> Result<Option<Reservation>, UseCaseError> {
        // The reservation id rides along as the client reference
        let by_reference = session
            .client_reference_id
            .as_deref()
            .or_else(|| {
                session
                    .metadata
                    .as_ref()
                    .and_then(|m| m.get("reservation_id").map(String::as_str))
            })
            .and_then(|raw| raw.parse().ok());

        if let Some(reservation_id) = by_reference {
            let found = ctx
                .repos
                .reservations
                .find(&reservation_id)
                .await
                .map_err(|_| UseCaseError::Retryable)?;
            if found.is_some() {
                return Ok(found);
            }
        }

        ctx.repos
            .reservations
            .find_by_payment_session(&soudan_domain::PaymentSessionId::new(session.id.clone()))
            .await
            .map_err(|_| UseCaseError::Retryable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_paid_sessions_capture() {
        assert_eq!(
            classify_event("checkout.session.completed", Some("paid")),
            ProviderEventKind::Captured
        );
    }

    #[test]
    fn completed_unpaid_sessions_are_pending_vouchers() {
        assert_eq!(
            classify_event("checkout.session.completed", Some("unpaid")),
            ProviderEventKind::PendingVoucher
        );
    }

    #[test]
    fn async_settlement_events_map_to_their_outcomes() {
        assert_eq!(
            classify_event("checkout.session.async_payment_succeeded", Some("paid")),
            ProviderEventKind::Captured
        );
        assert_eq!(
            classify_event("checkout.session.async_payment_failed", Some("unpaid")),
            ProviderEventKind::Aborted
        );
        assert_eq!(
            classify_event("checkout.session.expired", None),
            ProviderEventKind::Aborted
        );
    }

    #[test]
    fn unrelated_events_are_ignored() {
        assert_eq!(
            classify_event("payment_intent.created", None),
            ProviderEventKind::Irrelevant
        );
        assert_eq!(
            classify_event("checkout.session.completed", Some("no_payment_required")),
            ProviderEventKind::Irrelevant
        );
    }
}
