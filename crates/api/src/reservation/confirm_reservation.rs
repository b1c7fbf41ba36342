use chrono::{DateTime, Duration, Utc};
use soudan_domain::{
    split_amount,
    Meeting,
    MeetingId,
    PaymentId,
    PaymentStatus,
    PaymentTransfer,
    Reservation,
    TransferId,
    TransferStatus,
};
use soudan_infra::{
    google_calendar::GoogleCalendarProvider,
    stripe::StripePaymentProvider,
    ConfirmOutcome,
    SoudanContext,
};
use tracing::{error, info, warn};

use crate::shared::usecase::UseCase;

/// What a payment capture ended up doing to the reservation.
#[derive(Debug)]
pub(crate) enum ConfirmEffect {
    /// Meeting created (or found, on idempotent replay)
    MeetingCreated(MeetingId),
    /// The hold was gone; the captured payment was sent back
    RefundIssued,
}

/// Confirm a held reservation against a captured payment: flip the hold,
/// create the meeting atomically, then schedule the expert's payout and
/// create the external calendar entry.
#[derive(Debug)]
pub(crate) struct ConfirmReservationUseCase {
    pub reservation: Reservation,
    pub payment_id: PaymentId,
    /// What the provider actually captured, minor units
    pub amount_minor: i64,
    pub currency: String,
    pub now: DateTime<Utc>,
}

#[derive(Debug)]
pub(crate) enum UseCaseError {
    InternalError,
}

#[async_trait::async_trait]
impl UseCase for ConfirmReservationUseCase {
    type Response = ConfirmEffect;

    type Error = UseCaseError;

    const NAME: &'static str = "ConfirmReservation";

    async fn execute(&mut self, ctx: &SoudanContext) -> Result<Self::Response, Self::Error> {
        let meeting = Meeting {
            id: MeetingId::new_v4(),
            event_id: self.reservation.event_id.clone(),
            expert_id: self.reservation.expert_id.clone(),
            guest: self.reservation.guest.clone(),
            start_time: self.reservation.start_time,
            end_time: self.reservation.end_time,
            guest_timezone: self.reservation.guest_timezone,
            location_handle: Meeting::generate_location_handle(),
            guest_notes: self.reservation.guest_notes.clone(),
            payment_id: self.payment_id.clone(),
            payment_status: PaymentStatus::Captured,
            external_calendar_entry_id: None,
            created_at: self.now,
            cancelled_at: None,
            cancellation_actor: None,
        };

        let outcome = ctx
            .repos
            .reservations
            .confirm(&self.reservation.id, &meeting, self.now)
            .await
            .map_err(|_| UseCaseError::InternalError)?;

        match outcome {
            ConfirmOutcome::Confirmed(meeting) => {
                info!(
                    reservation_id = %self.reservation.id,
                    meeting_id = %meeting.id,
                    "Reservation confirmed, meeting created"
                );
                self.schedule_transfer(&meeting, ctx).await;
                self.create_calendar_entry(&meeting, ctx).await;
                Ok(ConfirmEffect::MeetingCreated(meeting.id))
            }
            ConfirmOutcome::AlreadyConfirmed(meeting) => {
                // Idempotent replay of the same capture
                Ok(ConfirmEffect::MeetingCreated(meeting.id))
            }
            ConfirmOutcome::Expired => {
                warn!(
                    reservation_id = %self.reservation.id,
                    "Capture arrived for an expired hold, refunding"
                );
                self.refund("expired-hold").await;
                Ok(ConfirmEffect::RefundIssued)
            }
            ConfirmOutcome::MeetingConflict => {
                error!(
                    reservation_id = %self.reservation.id,
                    "Meeting slot conflict at confirmation, refunding"
                );
                self.refund("slot-conflict").await;
                Ok(ConfirmEffect::RefundIssued)
            }
            ConfirmOutcome::NotFound => {
                warn!(
                    reservation_id = %self.reservation.id,
                    "Capture arrived for an unknown reservation, refunding"
                );
                self.refund("unknown-reservation").await;
                Ok(ConfirmEffect::RefundIssued)
            }
        }
    }
}

impl ConfirmReservationUseCase {
    async fn refund(&self, reason_tag: &str) {
        match StripePaymentProvider::from_config() {
            Ok(provider) => {
                if let Err(e) = provider.refund_payment(&self.payment_id, reason_tag).await {
                    error!(
                        payment_id = %self.payment_id,
                        error = ?e,
                        "Failed to refund captured payment"
                    );
                }
            }
            Err(e) => {
                error!(error = ?e, "Payment provider not configured, cannot refund");
            }
        }
    }

    /// Create the payout transfer for the captured amount. Failure here is
    /// logged but does not undo the meeting: the transfer sweep reconciles
    /// against meetings without transfers through operator tooling.
    async fn schedule_transfer(&self, meeting: &Meeting, ctx: &SoudanContext) {
        let expert = match ctx.repos.experts.find(&meeting.expert_id).await {
            Ok(Some(expert)) => expert,
            other => {
                error!(
                    expert_id = %meeting.expert_id,
                    result = ?other.err(),
                    "Expert missing while scheduling transfer"
                );
                return;
            }
        };
        let Some(account) = expert.payout_account_id else {
            error!(
                expert_id = %expert.id,
                "Expert has no payout account, transfer not scheduled"
            );
            return;
        };

        let split = split_amount(self.amount_minor, ctx.config.fee_rate);
        let transfer = PaymentTransfer {
            id: TransferId::new_v4(),
            meeting_id: meeting.id.clone(),
            expert_account_id: account,
            gross_amount: split.gross_amount,
            platform_fee: split.platform_fee,
            net_amount: split.expert_net,
            currency: self.currency.clone(),
            scheduled_at: meeting.start_time
                + Duration::minutes(ctx.config.payout_safety_delay_minutes),
            payment_created_at: self.now,
            status: TransferStatus::Pending,
            requires_approval: false,
            retry_count: 0,
            last_error: None,
            provider_transfer_id: None,
            created_at: self.now,
        };

        if let Err(e) = ctx.repos.transfers.insert(&transfer).await {
            error!(
                meeting_id = %meeting.id,
                error = ?e,
                "Failed to schedule payout transfer"
            );
        } else {
            info!(
                meeting_id = %meeting.id,
                transfer_id = %transfer.id,
                net_amount = transfer.net_amount,
                "Payout transfer scheduled"
            );
        }
    }

    /// Best effort; the meeting stands even when the external calendar
    /// write fails.
    async fn create_calendar_entry(&self, meeting: &Meeting, ctx: &SoudanContext) {
        let expert = match ctx.repos.experts.find(&meeting.expert_id).await {
            Ok(Some(expert)) => expert,
            _ => return,
        };
        let title = match ctx.repos.events.find(&meeting.event_id).await {
            Ok(Some(event)) => event.title,
            _ => "Meeting".to_string(),
        };

        let provider = match GoogleCalendarProvider::new(&expert, ctx).await {
            Ok(provider) => provider,
            Err(e) => {
                warn!(
                    meeting_id = %meeting.id,
                    error = ?e,
                    "Calendar unavailable, external entry not created"
                );
                return;
            }
        };

        match provider.insert_entry(meeting, &title).await {
            Ok(entry) => {
                if let Err(e) = ctx
                    .repos
                    .meetings
                    .set_calendar_entry(&meeting.id, Some(&entry))
                    .await
                {
                    error!(
                        meeting_id = %meeting.id,
                        error = ?e,
                        "Failed to record calendar entry id"
                    );
                }
            }
            Err(e) => {
                warn!(
                    meeting_id = %meeting.id,
                    error = ?e,
                    "Failed to create external calendar entry"
                );
            }
        }
    }
}
