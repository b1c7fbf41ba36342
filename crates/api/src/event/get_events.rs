use axum::{
    extract::{Path, Query, State},
    Json,
};
use soudan_api_structs::{
    dtos::EventDTO,
    get_events::{APIResponse, PathParams, QueryParams},
};
use soudan_infra::SoudanContext;

use crate::error::ApiError;

/// List an expert's bookable offerings, or look one up by slug.
pub async fn get_events_controller(
    State(ctx): State<SoudanContext>,
    Path(params): Path<PathParams>,
    Query(query): Query<QueryParams>,
) -> Result<Json<APIResponse>, ApiError> {
    ctx.repos
        .experts
        .find(&params.expert_id)
        .await
        .map_err(|_| ApiError::InternalError)?
        .ok_or_else(|| ApiError::NotFound("Expert was not found".into()))?;

    let events = match &query.slug {
        Some(slug) => ctx
            .repos
            .events
            .find_by_slug(&params.expert_id, slug)
            .await
            .map_err(|_| ApiError::InternalError)?
            .into_iter()
            .filter(|e| e.active || query.include_inactive)
            .collect(),
        None => ctx
            .repos
            .events
            .find_by_expert(&params.expert_id, !query.include_inactive)
            .await
            .map_err(|_| ApiError::InternalError)?,
    };

    Ok(Json(APIResponse {
        events: events.into_iter().map(EventDTO::new).collect(),
    }))
}
