use axum::{
    extract::{Path, State},
    Json,
};
use soudan_api_structs::{
    dtos::ScheduleDTO,
    save_schedule::{PathParams, RequestBody},
};
use soudan_domain::{ExpertId, Schedule, ScheduleWindow, Tz};
use soudan_infra::SoudanContext;

use crate::{
    error::ApiError,
    shared::usecase::{execute, UseCase},
};

pub async fn save_schedule_controller(
    State(ctx): State<SoudanContext>,
    Path(params): Path<PathParams>,
    Json(body): Json<RequestBody>,
) -> Result<Json<ScheduleDTO>, ApiError> {
    let timezone = body
        .timezone
        .as_deref()
        .map(|tz| {
            tz.parse::<Tz>()
                .map_err(|_| ApiError::BadClientData(format!("Unknown timezone: {tz}")))
        })
        .transpose()?;

    let usecase = SaveScheduleUseCase {
        expert_id: params.expert_id,
        timezone,
        windows: body.windows,
    };

    execute(usecase, &ctx)
        .await
        .map(|schedule| Json(ScheduleDTO::new(schedule)))
        .map_err(ApiError::from)
}

#[derive(Debug)]
pub(crate) struct SaveScheduleUseCase {
    pub expert_id: ExpertId,
    pub timezone: Option<Tz>,
    pub windows: Vec<ScheduleWindow>,
}

#[derive(Debug)]
pub(crate) enum UseCaseError {
    ExpertNotFound,
    InvalidSchedule(String),
    InternalError,
}

impl From<UseCaseError> for ApiError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::ExpertNotFound => Self::NotFound("Expert was not found".into()),
            UseCaseError::InvalidSchedule(msg) => Self::BadClientData(msg),
            UseCaseError::InternalError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for SaveScheduleUseCase {
    type Response = Schedule;

    type Error = UseCaseError;

    const NAME: &'static str = "SaveSchedule";

    async fn execute(&mut self, ctx: &SoudanContext) -> Result<Self::Response, Self::Error> {
        let expert = ctx
            .repos
            .experts
            .find(&self.expert_id)
            .await
            .map_err(|_| UseCaseError::InternalError)?
            .ok_or(UseCaseError::ExpertNotFound)?;

        let existing = ctx
            .repos
            .schedules
            .find(&self.expert_id)
            .await
            .map_err(|_| UseCaseError::InternalError)?;

        let timezone = self
            .timezone
            .or(existing.map(|s| s.timezone))
            .unwrap_or(expert.timezone);

        let schedule = Schedule {
            expert_id: self.expert_id.clone(),
            timezone,
            windows: std::mem::take(&mut self.windows),
        };
        schedule
            .validate()
            .map_err(|e| UseCaseError::InvalidSchedule(e.to_string()))?;

        ctx.repos
            .schedules
            .save(&schedule)
            .await
            .map_err(|_| UseCaseError::InternalError)?;

        Ok(schedule)
    }
}
