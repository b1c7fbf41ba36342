use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use soudan_api_structs::run_job::APIResponse;
use soudan_infra::SoudanContext;

use crate::{
    error::ApiError,
    payout::SweepTransfersUseCase,
    reservation::SweepReservationsUseCase,
    shared::usecase::execute,
    webhook::verify_cron_auth,
};

/// External cron trigger for the reservation expiry sweep.
pub async fn sweep_reservations_controller(
    State(ctx): State<SoudanContext>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<APIResponse>, ApiError> {
    verify_cron_auth(&ctx, &headers, &body)?;

    let usecase = SweepReservationsUseCase {
        now: ctx.sys.get_timestamp(),
    };
    execute(usecase, &ctx)
        .await
        .map(|outcome| {
            Json(APIResponse {
                processed: outcome.processed,
                failures: outcome.failures,
            })
        })
        .map_err(|_| ApiError::InternalError)
}

/// External cron trigger for the payout disbursement sweep.
pub async fn sweep_transfers_controller(
    State(ctx): State<SoudanContext>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<APIResponse>, ApiError> {
    verify_cron_auth(&ctx, &headers, &body)?;

    let usecase = SweepTransfersUseCase {
        now: ctx.sys.get_timestamp(),
    };
    execute(usecase, &ctx)
        .await
        .map(|outcome| {
            Json(APIResponse {
                processed: outcome.processed,
                failures: outcome.failures,
            })
        })
        .map_err(|_| ApiError::InternalError)
}
