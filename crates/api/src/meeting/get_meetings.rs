use axum::{
    extract::{Query, State},
    Json,
};
use soudan_api_structs::{
    dtos::MeetingDTO,
    get_meetings::{APIResponse, QueryParams},
};
use soudan_domain::{ExpertId, GuestIdentifier, Meeting, TimeSpan};

/// Bound on a meetings listing query, to keep one request from scanning
/// years of history
const MAX_RANGE_MINUTES: i64 = 366 * 24 * 60;
use soudan_infra::SoudanContext;

use crate::{
    error::ApiError,
    shared::usecase::{execute, UseCase},
};

pub async fn get_meetings_controller(
    State(ctx): State<SoudanContext>,
    Query(query): Query<QueryParams>,
) -> Result<Json<APIResponse>, ApiError> {
    let owner = match (query.expert_id, query.guest_identifier) {
        (Some(expert_id), None) => MeetingOwner::Expert(expert_id),
        (None, Some(guest)) => MeetingOwner::Guest(GuestIdentifier::new(guest)),
        _ => {
            return Err(ApiError::BadClientData(
                "Provide exactly one of expertId or guestIdentifier".into(),
            ))
        }
    };

    if query.from >= query.to {
        return Err(ApiError::BadClientData(
            "`from` must be before `to`".into(),
        ));
    }
    let range = TimeSpan::new(query.from, query.to);
    if range.greater_than_minutes(MAX_RANGE_MINUTES) {
        return Err(ApiError::BadClientData(
            "The requested range is too large".into(),
        ));
    }

    let usecase = GetMeetingsUseCase { owner, range };

    execute(usecase, &ctx)
        .await
        .map(|meetings| {
            Json(APIResponse {
                meetings: meetings.into_iter().map(MeetingDTO::new).collect(),
            })
        })
        .map_err(ApiError::from)
}

#[derive(Debug)]
pub(crate) enum MeetingOwner {
    Expert(ExpertId),
    Guest(GuestIdentifier),
}

#[derive(Debug)]
pub(crate) struct GetMeetingsUseCase {
    pub owner: MeetingOwner,
    pub range: TimeSpan,
}

#[derive(Debug)]
pub(crate) enum UseCaseError {
    InternalError,
}

impl From<UseCaseError> for ApiError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::InternalError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for GetMeetingsUseCase {
    type Response = Vec<Meeting>;

    type Error = UseCaseError;

    const NAME: &'static str = "GetMeetings";

    async fn execute(&mut self, ctx: &SoudanContext) -> Result<Self::Response, Self::Error> {
        match &self.owner {
            MeetingOwner::Expert(expert_id) => {
                ctx.repos
                    .meetings
                    .find_by_expert(expert_id, &self.range)
                    .await
            }
            MeetingOwner::Guest(guest) => {
                ctx.repos.meetings.find_by_guest(guest, &self.range).await
            }
        }
        .map_err(|_| UseCaseError::InternalError)
    }
}
