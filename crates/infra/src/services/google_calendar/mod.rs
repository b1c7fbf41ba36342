pub mod auth_provider;
mod calendar_api;

use std::time::Duration;

use calendar_api::{GoogleCalendarEventAttributes, GoogleCalendarRestApi, GoogleEventTime};
use moka::future::Cache;
use soudan_domain::{
    resolve_local_earliest,
    CalendarEntryId,
    Expert,
    Interval,
    Meeting,
    TimeSpan,
    Tz,
};
use thiserror::Error;

use crate::SoudanContext;

/// How long a positive token probe stays cached; failures are never cached.
const TOKEN_PROBE_TTL_SECS: u64 = 60;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarGatewayError {
    /// The expert never connected a calendar, or the refresh token died
    #[error("Calendar is not connected")]
    NotConnected,
    #[error("Calendar access token expired and could not be refreshed")]
    TokenExpired,
    #[error("Calendar provider rate limited the request")]
    RateLimited,
    #[error("Calendar provider unavailable")]
    ProviderUnavailable,
}

/// Cache of positive `has_valid_tokens` probes, so rendering a booking page
/// does not refresh tokens on every request.
#[derive(Clone)]
pub struct TokenProbeCache {
    cache: Cache<String, ()>,
}

impl TokenProbeCache {
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .time_to_live(Duration::from_secs(TOKEN_PROBE_TTL_SECS))
                .max_capacity(10_000)
                .build(),
        }
    }
}

impl Default for TokenProbeCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether the expert's calendar connection can currently produce an access
/// token. Positive answers are cached for a short TTL; negative answers are
/// re-probed every time so a reconnect becomes visible immediately.
pub async fn has_valid_tokens(expert: &Expert, ctx: &SoudanContext) -> bool {
    let key = expert.id.to_string();
    if ctx.token_probe.cache.get(&key).await.is_some() {
        return true;
    }
    if auth_provider::get_access_token(expert, ctx).await.is_some() {
        ctx.token_probe.cache.insert(key, ()).await;
        true
    } else {
        false
    }
}

pub struct GoogleCalendarProvider {
    api: GoogleCalendarRestApi,
    timezone: Tz,
}

impl GoogleCalendarProvider {
    pub async fn new(expert: &Expert, ctx: &SoudanContext) -> Result<Self, CalendarGatewayError> {
        let access_token = match auth_provider::get_access_token(expert, ctx).await {
            Some(token) => token,
            None => return Err(CalendarGatewayError::NotConnected),
        };
        Ok(Self {
            api: GoogleCalendarRestApi::new(access_token),
            timezone: expert.timezone,
        })
    }

    /// Busy intervals of the expert's primary calendar over `[from, to)`.
    ///
    /// Intervals are trimmed to the queried span; all-day entries expand to
    /// the expert's local day; cancelled entries, declined invitations and
    /// transparent events do not count as busy.
    pub async fn busy_intervals(
        &self,
        span: &TimeSpan,
    ) -> Result<Vec<Interval>, CalendarGatewayError> {
        let items = self
            .api
            .list_event_instances(span.start(), span.end())
            .await?;

        let mut intervals = Vec::with_capacity(items.len());
        for item in items {
            if item.status.as_deref() == Some("cancelled") {
                continue;
            }
            if item.transparency.as_deref() == Some("transparent") {
                continue;
            }
            let declined = item.attendees.as_ref().is_some_and(|attendees| {
                attendees
                    .iter()
                    .any(|a| a.is_self && a.response_status.as_deref() == Some("declined"))
            });
            if declined {
                continue;
            }

            let Some(interval) = self.event_interval(item.start.as_ref(), item.end.as_ref())
            else {
                continue;
            };

            // Trim to the queried span
            let start = interval.start.max(span.start());
            let end = interval.end.min(span.end());
            if let Some(trimmed) = Interval::new(start, end) {
                intervals.push(trimmed);
            }
        }

        Ok(intervals)
    }

    fn event_interval(
        &self,
        start: Option<&GoogleEventTime>,
        end: Option<&GoogleEventTime>,
    ) -> Option<Interval> {
        let start = start?;
        let end = end?;

        match (start.date_time, end.date_time) {
            (Some(start), Some(end)) => Interval::new(start, end),
            _ => {
                // All-day entry: `date` bounds in the expert's local days.
                // Google's end date is exclusive.
                let start_date = start.date?;
                let end_date = end.date?;
                let start =
                    resolve_local_earliest(&self.timezone, start_date.and_hms_opt(0, 0, 0)?);
                let end = resolve_local_earliest(&self.timezone, end_date.and_hms_opt(0, 0, 0)?);
                Interval::new(start, end)
            }
        }
    }

    /// Create the external calendar entry for a confirmed meeting.
    pub async fn insert_entry(
        &self,
        meeting: &Meeting,
        title: &str,
    ) -> Result<CalendarEntryId, CalendarGatewayError> {
        let attributes = GoogleCalendarEventAttributes {
            summary: format!("{} with {}", title, meeting.guest),
            description: format!("Video room: {}", meeting.location_handle),
            start: GoogleEventTime {
                date_time: Some(meeting.start_time),
                date: None,
            },
            end: GoogleEventTime {
                date_time: Some(meeting.end_time),
                date: None,
            },
        };
        let created = self.api.insert(&attributes).await?;
        Ok(CalendarEntryId::new(created.id))
    }

    pub async fn delete_entry(&self, entry: &CalendarEntryId) -> Result<(), CalendarGatewayError> {
        self.api.remove(entry.as_str()).await
    }
}

