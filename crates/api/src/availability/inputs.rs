use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use soudan_domain::{
    booking_slots::candidate_window,
    local_date,
    BookingPolicy,
    Event,
    EventId,
    Expert,
    ExpertId,
    IntervalSet,
    Schedule,
    TimeSpan,
};
use soudan_infra::{
    google_calendar::{self, CalendarGatewayError, GoogleCalendarProvider},
    SoudanContext,
};
use tracing::error;

/// Everything the availability engine needs for one expert/event pair,
/// loaded from the stores and the calendar gateway.
#[derive(Debug)]
pub(crate) struct BookingInputs {
    pub expert: Expert,
    pub event: Event,
    pub policy: BookingPolicy,
    pub schedule: Schedule,
    pub blocked_dates: HashSet<NaiveDate>,
    pub busy: IntervalSet,
}

#[derive(Debug)]
pub(crate) enum BookingInputsError {
    ExpertNotFound,
    EventNotFound,
    /// Probe failed: no live calendar connection, booking pages must not render
    CalendarNotConnected,
    /// Calendar fetch failed; explicitly NOT "no busy intervals"
    AvailabilityUnknown,
    InternalError,
}

impl From<CalendarGatewayError> for BookingInputsError {
    fn from(e: CalendarGatewayError) -> Self {
        match e {
            CalendarGatewayError::NotConnected => Self::CalendarNotConnected,
            CalendarGatewayError::TokenExpired
            | CalendarGatewayError::RateLimited
            | CalendarGatewayError::ProviderUnavailable => Self::AvailabilityUnknown,
        }
    }
}

pub(crate) async fn load_booking_inputs(
    expert_id: &ExpertId,
    event_id: &EventId,
    now: DateTime<Utc>,
    ctx: &SoudanContext,
) -> Result<BookingInputs, BookingInputsError> {
    let expert = ctx
        .repos
        .experts
        .find(expert_id)
        .await
        .map_err(|_| BookingInputsError::InternalError)?
        .ok_or(BookingInputsError::ExpertNotFound)?;
    if !expert.is_bookable() {
        return Err(BookingInputsError::ExpertNotFound);
    }

    let event = ctx
        .repos
        .events
        .find(event_id)
        .await
        .map_err(|_| BookingInputsError::InternalError)?
        .filter(|e| e.expert_id == expert.id && e.active)
        .ok_or(BookingInputsError::EventNotFound)?;

    let policy = ctx
        .config
        .default_booking_policy
        .with_overrides(&expert.policy_overrides);

    let schedule = ctx
        .repos
        .schedules
        .find(&expert.id)
        .await
        .map_err(|_| BookingInputsError::InternalError)?
        .unwrap_or_else(|| Schedule::new(expert.id.clone(), expert.timezone));

    // The buffers probe outside the candidate window, so load the busy
    // sources over a slightly wider span
    let window = candidate_window(now, &policy, &expert.timezone);
    let busy_span = TimeSpan::new(
        window.start() - Duration::minutes(policy.before_event_buffer),
        window.end() + Duration::minutes(policy.after_event_buffer),
    );

    let blocked_dates: HashSet<NaiveDate> = ctx
        .repos
        .blocked_dates
        .list(
            &expert.id,
            local_date(window.start(), &expert.timezone),
            local_date(window.end(), &expert.timezone),
        )
        .await
        .map_err(|_| BookingInputsError::InternalError)?
        .into_iter()
        .collect();

    if !google_calendar::has_valid_tokens(&expert, ctx).await {
        return Err(BookingInputsError::CalendarNotConnected);
    }

    let provider = GoogleCalendarProvider::new(&expert, ctx).await?;
    let calendar_busy = provider.busy_intervals(&busy_span).await?;

    let hold_busy = ctx
        .repos
        .reservations
        .busy_intervals(&expert.id, &busy_span, now)
        .await
        .inspect_err(|e| error!(error = ?e, "Failed to load hold busy intervals"))
        .map_err(|_| BookingInputsError::InternalError)?;

    let meeting_busy = ctx
        .repos
        .meetings
        .busy_intervals(&expert.id, &busy_span)
        .await
        .inspect_err(|e| error!(error = ?e, "Failed to load meeting busy intervals"))
        .map_err(|_| BookingInputsError::InternalError)?;

    let mut busy = calendar_busy;
    busy.extend(hold_busy);
    busy.extend(meeting_busy);

    Ok(BookingInputs {
        expert,
        event,
        policy,
        schedule,
        blocked_dates,
        busy: IntervalSet::new(busy),
    })
}
