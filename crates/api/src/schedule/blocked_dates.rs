use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use soudan_api_structs::{add_blocked_date, list_blocked_dates, remove_blocked_date};
use soudan_domain::ExpertId;
use soudan_infra::SoudanContext;

use crate::error::ApiError;

async fn ensure_expert_exists(
    expert_id: &ExpertId,
    ctx: &SoudanContext,
) -> Result<(), ApiError> {
    ctx.repos
        .experts
        .find(expert_id)
        .await
        .map_err(|_| ApiError::InternalError)?
        .map(|_| ())
        .ok_or_else(|| ApiError::NotFound("Expert was not found".into()))
}

pub async fn list_blocked_dates_controller(
    State(ctx): State<SoudanContext>,
    Path(params): Path<list_blocked_dates::PathParams>,
    Query(query): Query<list_blocked_dates::QueryParams>,
) -> Result<Json<list_blocked_dates::APIResponse>, ApiError> {
    ensure_expert_exists(&params.expert_id, &ctx).await?;

    if query.from > query.to {
        return Err(ApiError::BadClientData("`from` must not be after `to`".into()));
    }

    let dates = ctx
        .repos
        .blocked_dates
        .list(&params.expert_id, query.from, query.to)
        .await
        .map_err(|_| ApiError::InternalError)?;

    Ok(Json(list_blocked_dates::APIResponse { dates }))
}

pub async fn add_blocked_date_controller(
    State(ctx): State<SoudanContext>,
    Path(params): Path<add_blocked_date::PathParams>,
    Json(body): Json<add_blocked_date::RequestBody>,
) -> Result<StatusCode, ApiError> {
    ensure_expert_exists(&params.expert_id, &ctx).await?;

    ctx.repos
        .blocked_dates
        .add(&params.expert_id, body.date)
        .await
        .map_err(|_| ApiError::InternalError)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_blocked_date_controller(
    State(ctx): State<SoudanContext>,
    Path(params): Path<remove_blocked_date::PathParams>,
) -> Result<StatusCode, ApiError> {
    ensure_expert_exists(&params.expert_id, &ctx).await?;

    ctx.repos
        .blocked_dates
        .remove(&params.expert_id, params.date)
        .await
        .map_err(|_| ApiError::InternalError)?;

    Ok(StatusCode::NO_CONTENT)
}
