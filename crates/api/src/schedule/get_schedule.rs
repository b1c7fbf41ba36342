use axum::{
    extract::{Path, State},
    Json,
};
use soudan_api_structs::{dtos::ScheduleDTO, get_schedule::PathParams};
use soudan_domain::{ExpertId, Schedule};
use soudan_infra::SoudanContext;

use crate::{
    error::ApiError,
    shared::usecase::{execute, UseCase},
};

pub async fn get_schedule_controller(
    State(ctx): State<SoudanContext>,
    Path(params): Path<PathParams>,
) -> Result<Json<ScheduleDTO>, ApiError> {
    let usecase = GetScheduleUseCase {
        expert_id: params.expert_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|schedule| Json(ScheduleDTO::new(schedule)))
        .map_err(ApiError::from)
}

#[derive(Debug)]
pub(crate) struct GetScheduleUseCase {
    pub expert_id: ExpertId,
}

#[derive(Debug)]
pub(crate) enum UseCaseError {
    ExpertNotFound,
    InternalError,
}

impl From<UseCaseError> for ApiError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::ExpertNotFound => Self::NotFound("Expert was not found".into()),
            UseCaseError::InternalError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for GetScheduleUseCase {
    type Response = Schedule;

    type Error = UseCaseError;

    const NAME: &'static str = "GetSchedule";

    async fn execute(&mut self, ctx: &SoudanContext) -> Result<Self::Response, Self::Error> {
        let expert = ctx
            .repos
            .experts
            .find(&self.expert_id)
            .await
            .map_err(|_| UseCaseError::InternalError)?
            .ok_or(UseCaseError::ExpertNotFound)?;

        // An expert without saved windows has an empty schedule in their
        // home timezone, not a missing one
        ctx.repos
            .schedules
            .find(&self.expert_id)
            .await
            .map_err(|_| UseCaseError::InternalError)
            .map(|schedule| {
                schedule.unwrap_or_else(|| Schedule::new(expert.id.clone(), expert.timezone))
            })
    }
}
