use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use soudan_api_structs::get_availability::{APIResponse, QueryParams};
use soudan_domain::{
    booking_slots::{bookable_starts, AvailabilityInputs},
    EventId,
    ExpertId,
};
use soudan_infra::SoudanContext;

use super::inputs::{load_booking_inputs, BookingInputsError};
use crate::{
    error::ApiError,
    shared::usecase::{execute, UseCase},
};

pub async fn get_availability_controller(
    State(ctx): State<SoudanContext>,
    Query(query): Query<QueryParams>,
) -> Result<Json<APIResponse>, ApiError> {
    let usecase = GetAvailabilityUseCase {
        expert_id: query.expert_id,
        event_id: query.event_id,
        now: ctx.sys.get_timestamp(),
    };

    execute(usecase, &ctx)
        .await
        .map(|res| {
            Json(APIResponse {
                timezone: res.timezone,
                candidates: res.candidates,
            })
        })
        .map_err(ApiError::from)
}

#[derive(Debug)]
pub(crate) struct GetAvailabilityUseCase {
    pub expert_id: ExpertId,
    pub event_id: EventId,
    pub now: DateTime<Utc>,
}

#[derive(Debug)]
pub(crate) struct UseCaseRes {
    pub timezone: String,
    pub candidates: Vec<DateTime<Utc>>,
}

#[derive(Debug)]
pub(crate) enum UseCaseError {
    ExpertNotFound,
    EventNotFound,
    CalendarNotConnected,
    AvailabilityUnknown,
    InternalError,
}

impl From<BookingInputsError> for UseCaseError {
    fn from(e: BookingInputsError) -> Self {
        match e {
            BookingInputsError::ExpertNotFound => Self::ExpertNotFound,
            BookingInputsError::EventNotFound => Self::EventNotFound,
            BookingInputsError::CalendarNotConnected => Self::CalendarNotConnected,
            BookingInputsError::AvailabilityUnknown => Self::AvailabilityUnknown,
            BookingInputsError::InternalError => Self::InternalError,
        }
    }
}

impl From<UseCaseError> for ApiError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::ExpertNotFound => Self::NotFound("Expert was not found".into()),
            UseCaseError::EventNotFound => Self::NotFound("Event was not found".into()),
            UseCaseError::CalendarNotConnected => Self::CalendarNotConnected,
            UseCaseError::AvailabilityUnknown => Self::AvailabilityUnknown,
            UseCaseError::InternalError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for GetAvailabilityUseCase {
    type Response = UseCaseRes;

    type Error = UseCaseError;

    const NAME: &'static str = "GetAvailability";

    async fn execute(&mut self, ctx: &SoudanContext) -> Result<Self::Response, Self::Error> {
        let inputs = load_booking_inputs(&self.expert_id, &self.event_id, self.now, ctx).await?;

        let candidates = bookable_starts(&AvailabilityInputs {
            schedule: &inputs.schedule,
            policy: inputs.policy,
            duration_minutes: inputs.event.duration_minutes,
            blocked_dates: &inputs.blocked_dates,
            busy: &inputs.busy,
            now: self.now,
        });

        // An empty sequence is a valid answer (NoSlots), distinct from the
        // availability-unknown failure surfaced above
        Ok(UseCaseRes {
            timezone: inputs.expert.timezone.to_string(),
            candidates,
        })
    }
}
