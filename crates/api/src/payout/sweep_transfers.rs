use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use soudan_domain::{PaymentTransfer, ProviderTransferId};
use soudan_infra::{
    stripe::{CreateTransferRequest, PaymentProviderError, StripePaymentProvider},
    SoudanContext,
};
use soudan_utils::error_with_backtrace;
use tracing::{error, info, warn};

use crate::shared::usecase::UseCase;

/// How many due transfers one sweep picks up
const SWEEP_BATCH_SIZE: i64 = 50;

/// In-attempt backoff before re-calling the provider, seconds.
/// Across sweeps, backoff comes from the sweep cadence itself.
const IN_ATTEMPT_BACKOFF_SECS: [u64; 3] = [1, 2, 4];

/// Disburse aged transfers. Safe to run from several workers at once: each
/// transfer is claimed with a conditional update before the provider call,
/// and the provider call carries a deterministic idempotency key.
#[derive(Debug)]
pub(crate) struct SweepTransfersUseCase {
    pub now: DateTime<Utc>,
}

#[derive(Debug)]
pub(crate) struct SweepOutcome {
    pub processed: u64,
    pub failures: u64,
}

#[derive(Debug)]
pub(crate) enum UseCaseError {
    InternalError,
}

#[async_trait::async_trait]
impl UseCase for SweepTransfersUseCase {
    type Response = SweepOutcome;

    type Error = UseCaseError;

    const NAME: &'static str = "SweepTransfers";

    async fn execute(&mut self, ctx: &SoudanContext) -> Result<Self::Response, Self::Error> {
        let due = ctx
            .repos
            .transfers
            .find_due(self.now, SWEEP_BATCH_SIZE)
            .await
            .map_err(|_| UseCaseError::InternalError)?;

        let mut processed = 0;
        let mut failures = 0;

        for transfer in due {
            match self.process(&transfer, ctx).await {
                Ok(true) => processed += 1,
                Ok(false) => {}
                Err(()) => failures += 1,
            }
        }

        Ok(SweepOutcome {
            processed,
            failures,
        })
    }
}

impl SweepTransfersUseCase {
    /// Ok(true) when this worker disbursed or voided the transfer,
    /// Ok(false) when it was skipped (not aged, claimed elsewhere),
    /// Err(()) when the provider call failed.
    async fn process(
        &self,
        transfer: &PaymentTransfer,
        ctx: &SoudanContext,
    ) -> Result<bool, ()> {
        let meeting = ctx
            .repos
            .meetings
            .find(&transfer.meeting_id)
            .await
            .map_err(|_| ())?;
        let Some(meeting) = meeting else {
            error!(
                transfer_id = %transfer.id,
                meeting_id = %transfer.meeting_id,
                "Transfer points at a missing meeting"
            );
            return Err(());
        };

        // A cancelled meeting never disburses
        if meeting.cancelled_at.is_some() {
            let voided = ctx
                .repos
                .transfers
                .void_for_meeting(&meeting.id)
                .await
                .map_err(|_| ())?;
            if voided > 0 {
                info!(
                    transfer_id = %transfer.id,
                    meeting_id = %meeting.id,
                    "Voided transfer of cancelled meeting"
                );
            }
            return Ok(voided > 0);
        }

        let expert = ctx
            .repos
            .experts
            .find(&meeting.expert_id)
            .await
            .map_err(|_| ())?
            .ok_or(())?;

        // Aging floor per the expert's country; APPROVED bypasses it but
        // still honors the scheduled instant
        let delay_days = ctx.config.payout_delay_days(&expert.country);
        if !transfer.is_eligible(self.now, delay_days) {
            return Ok(false);
        }

        let Some(claimed) = ctx
            .repos
            .transfers
            .claim(&transfer.id, self.now)
            .await
            .map_err(|_| ())?
        else {
            // Another worker holds it, or it just left the claimable states
            return Ok(false);
        };

        match self.disburse(&claimed, ctx).await {
            Ok(provider_transfer_id) => {
                let completed = ctx
                    .repos
                    .transfers
                    .complete(&claimed.id, &provider_transfer_id)
                    .await
                    .map_err(|_| ())?;
                if !completed {
                    // Money moved but our row transitioned underneath us;
                    // surface loudly for reconciliation
                    error_with_backtrace!(
                        transfer_id = %claimed.id,
                        provider_transfer_id = %provider_transfer_id,
                        "Disbursed transfer could not be marked completed"
                    );
                    return Err(());
                }
                info!(
                    transfer_id = %claimed.id,
                    net_amount = claimed.net_amount,
                    "Transfer disbursed"
                );
                Ok(true)
            }
            Err(e) => {
                let status = ctx
                    .repos
                    .transfers
                    .record_failure(&claimed.id, &e.to_string())
                    .await
                    .map_err(|_| ())?;
                warn!(
                    transfer_id = %claimed.id,
                    status = ?status,
                    error = %e,
                    "Transfer disbursement failed"
                );
                Err(())
            }
        }
    }

    /// One disbursement attempt, retrying transient provider errors with
    /// short exponential backoff inside the attempt.
    async fn disburse(
        &self,
        transfer: &PaymentTransfer,
        ctx: &SoudanContext,
    ) -> Result<ProviderTransferId, PaymentProviderError> {
        let provider = StripePaymentProvider::from_config()?;
        let meeting = ctx
            .repos
            .meetings
            .find(&transfer.meeting_id)
            .await
            .ok()
            .flatten();
        let (payment_id, expert_id, session_start) = match meeting {
            Some(m) => (m.payment_id, m.expert_id, m.start_time),
            None => {
                return Err(PaymentProviderError::Api {
                    status_code: 0,
                    message: "Meeting vanished before disbursement".into(),
                })
            }
        };

        let mut last_error = None;
        for (attempt, backoff_secs) in std::iter::once(None)
            .chain(IN_ATTEMPT_BACKOFF_SECS.iter().copied().map(Some))
            .enumerate()
        {
            if let Some(secs) = backoff_secs {
                tokio::time::sleep(StdDuration::from_secs(secs)).await;
            }

            match provider
                .create_transfer(CreateTransferRequest {
                    transfer_id: transfer.id.clone(),
                    meeting_id: transfer.meeting_id.clone(),
                    expert_id: expert_id.clone(),
                    destination: transfer.expert_account_id.clone(),
                    amount_minor: transfer.net_amount,
                    currency: transfer.currency.clone(),
                    source_transaction: payment_id.clone(),
                    session_start,
                })
                .await
            {
                Ok(id) => return Ok(id),
                // Transient: retry within the attempt
                Err(e @ (PaymentProviderError::RateLimited | PaymentProviderError::Network(_))) => {
                    warn!(
                        transfer_id = %transfer.id,
                        attempt,
                        error = %e,
                        "Transient provider error during disbursement"
                    );
                    last_error = Some(e);
                }
                // Anything else is not retried in-attempt
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(PaymentProviderError::NotConfigured))
    }
}
