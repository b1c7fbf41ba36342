use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use soudan_api_structs::cancel_meeting::{PathParams, RequestBody};
use soudan_domain::{CancellationActor, MeetingId};
use soudan_infra::{google_calendar::GoogleCalendarProvider, SoudanContext};
use tracing::{info, warn};
use validator::Validate;

use crate::{
    error::ApiError,
    shared::usecase::{execute, UseCase},
};

pub async fn cancel_meeting_controller(
    State(ctx): State<SoudanContext>,
    Path(params): Path<PathParams>,
    Json(body): Json<RequestBody>,
) -> Result<StatusCode, ApiError> {
    body.validate()
        .map_err(|e| ApiError::BadClientData(e.to_string()))?;

    let actor = match body.actor.as_deref() {
        Some("expert") => CancellationActor::Expert,
        Some("guest") | None => CancellationActor::Guest,
        Some("system") => CancellationActor::System,
        Some(other) => {
            return Err(ApiError::BadClientData(format!(
                "Unknown cancellation actor: {other}"
            )))
        }
    };

    let usecase = CancelMeetingUseCase {
        meeting_id: params.meeting_id,
        reason: body.reason,
        actor,
        now: ctx.sys.get_timestamp(),
    };

    execute(usecase, &ctx)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(ApiError::from)
}

#[derive(Debug)]
pub(crate) struct CancelMeetingUseCase {
    pub meeting_id: MeetingId,
    pub reason: String,
    pub actor: CancellationActor,
    pub now: DateTime<Utc>,
}

#[derive(Debug)]
pub(crate) enum UseCaseError {
    NotFound,
    InternalError,
}

impl From<UseCaseError> for ApiError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound => Self::NotFound("Meeting was not found".into()),
            UseCaseError::InternalError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for CancelMeetingUseCase {
    type Response = ();

    type Error = UseCaseError;

    const NAME: &'static str = "CancelMeeting";

    async fn execute(&mut self, ctx: &SoudanContext) -> Result<Self::Response, Self::Error> {
        let meeting = ctx
            .repos
            .meetings
            .find(&self.meeting_id)
            .await
            .map_err(|_| UseCaseError::InternalError)?
            .ok_or(UseCaseError::NotFound)?;

        let cancelled = ctx
            .repos
            .meetings
            .cancel(&self.meeting_id, self.now, self.actor)
            .await
            .map_err(|_| UseCaseError::InternalError)?;

        if !cancelled {
            // Already cancelled; replaying the cancellation is a no-op
            return Ok(());
        }

        info!(
            meeting_id = %self.meeting_id,
            actor = %self.actor.as_str(),
            reason = %self.reason,
            "Meeting cancelled"
        );

        // Never disburse a cancelled meeting's payout
        let voided = ctx
            .repos
            .transfers
            .void_for_meeting(&self.meeting_id)
            .await
            .map_err(|_| UseCaseError::InternalError)?;
        if voided > 0 {
            info!(
                meeting_id = %self.meeting_id,
                voided,
                "Voided pending transfer(s)"
            );
        }

        // Best effort: remove the external calendar entry
        if let Some(entry) = &meeting.external_calendar_entry_id {
            let expert = ctx
                .repos
                .experts
                .find(&meeting.expert_id)
                .await
                .ok()
                .flatten();
            if let Some(expert) = expert {
                match GoogleCalendarProvider::new(&expert, ctx).await {
                    Ok(provider) => {
                        if let Err(e) = provider.delete_entry(entry).await {
                            warn!(
                                meeting_id = %self.meeting_id,
                                error = ?e,
                                "Failed to delete external calendar entry"
                            );
                        } else if let Err(e) = ctx
                            .repos
                            .meetings
                            .set_calendar_entry(&self.meeting_id, None)
                            .await
                        {
                            warn!(
                                meeting_id = %self.meeting_id,
                                error = ?e,
                                "Failed to clear calendar entry id"
                            );
                        }
                    }
                    Err(e) => {
                        warn!(
                            meeting_id = %self.meeting_id,
                            error = ?e,
                            "Calendar unavailable, external entry left in place"
                        );
                    }
                }
            }
        }

        Ok(())
    }
}
