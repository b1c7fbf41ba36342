use chrono::{DateTime, Utc};
use soudan_infra::{stripe::StripePaymentProvider, SoudanContext};
use tracing::{info, warn};

use crate::shared::usecase::UseCase;

/// Flip HELD reservations past their deadline to EXPIRED and close their
/// checkout sessions. Safe to run concurrently with confirmations and from
/// multiple workers: the flip is a conditional update.
#[derive(Debug)]
pub(crate) struct SweepReservationsUseCase {
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
impl UseCase for SweepReservationsUseCase {
    type Response = SweepOutcome;

    type Error = UseCaseError;

    const NAME: &'static str = "SweepReservations";

    async fn execute(&mut self, ctx: &SoudanContext) -> Result<Self::Response, Self::Error> {
        let expired = ctx
            .repos
            .reservations
            .sweep_expired(self.now)
            .await
            .map_err(|_| UseCaseError::InternalError)?;

        if expired.is_empty() {
            return Ok(SweepOutcome {
                processed: 0,
                failures: 0,
            });
        }

        info!(count = expired.len(), "Expired stale reservations");

        let provider = StripePaymentProvider::from_config().ok();
        let mut failures = 0;
        for reservation in &expired {
            let Some(session_id) = &reservation.payment_session_id else {
                continue;
            };
            let Some(provider) = &provider else {
                failures += 1;
                continue;
            };
            if let Err(e) = provider.expire_session(session_id).await {
                warn!(
                    reservation_id = %reservation.id,
                    error = ?e,
                    "Failed to expire checkout session of expired hold"
                );
                failures += 1;
            }
        }

        Ok(SweepOutcome {
            processed: expired.len() as u64,
            failures,
        })
    }
}
