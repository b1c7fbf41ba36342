use axum::{
    extract::{Path, State},
    Json,
};
use soudan_api_structs::{dtos::ReservationDTO, get_reservation::PathParams};
use soudan_infra::SoudanContext;

use crate::error::ApiError;

/// The booking frontend polls this while a voucher-style payment settles.
pub async fn get_reservation_controller(
    State(ctx): State<SoudanContext>,
    Path(params): Path<PathParams>,
) -> Result<Json<ReservationDTO>, ApiError> {
    ctx.repos
        .reservations
        .find(&params.reservation_id)
        .await
        .map_err(|_| ApiError::InternalError)?
        .map(|reservation| Json(ReservationDTO::new(reservation)))
        .ok_or_else(|| ApiError::NotFound("Reservation was not found".into()))
}
