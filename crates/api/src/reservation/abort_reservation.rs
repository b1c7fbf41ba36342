use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use soudan_api_structs::abort_reservation::PathParams;
use soudan_domain::ReservationId;
use soudan_infra::{stripe::StripePaymentProvider, SoudanContext};
use tracing::{info, warn};

use crate::{
    error::ApiError,
    shared::usecase::{execute, UseCase},
};

pub async fn abort_reservation_controller(
    State(ctx): State<SoudanContext>,
    Path(params): Path<PathParams>,
) -> Result<StatusCode, ApiError> {
    let usecase = AbortReservationUseCase {
        reservation_id: params.reservation_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(ApiError::from)
}

#[derive(Debug)]
pub(crate) struct AbortReservationUseCase {
    pub reservation_id: ReservationId,
}

#[derive(Debug)]
pub(crate) enum UseCaseError {
    NotFound,
    InternalError,
}

impl From<UseCaseError> for ApiError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound => Self::NotFound("Reservation was not found".into()),
            UseCaseError::InternalError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for AbortReservationUseCase {
    type Response = ();

    type Error = UseCaseError;

    const NAME: &'static str = "AbortReservation";

    async fn execute(&mut self, ctx: &SoudanContext) -> Result<Self::Response, Self::Error> {
        let reservation = ctx
            .repos
            .reservations
            .find(&self.reservation_id)
            .await
            .map_err(|_| UseCaseError::InternalError)?
            .ok_or(UseCaseError::NotFound)?;

        let aborted = ctx
            .repos
            .reservations
            .abort(&self.reservation_id)
            .await
            .map_err(|_| UseCaseError::InternalError)?;

        if !aborted {
            // Terminal already; abort is a no-op
            return Ok(());
        }

        info!(reservation_id = %self.reservation_id, "Reservation aborted");

        // Best effort: close the checkout session so the guest cannot pay
        // for a hold that no longer exists
        if let Some(session_id) = &reservation.payment_session_id {
            match StripePaymentProvider::from_config() {
                Ok(provider) => {
                    if let Err(e) = provider.expire_session(session_id).await {
                        warn!(
                            reservation_id = %self.reservation_id,
                            error = ?e,
                            "Failed to expire checkout session of aborted hold"
                        );
                    }
                }
                Err(e) => {
                    warn!(error = ?e, "Payment provider not configured, session left open");
                }
            }
        }

        Ok(())
    }
}
