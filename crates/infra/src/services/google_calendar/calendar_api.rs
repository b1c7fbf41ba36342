use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::CalendarGatewayError;

const API_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";
const PRIMARY_CALENDAR: &str = "primary";
const RATE_LIMIT_ATTEMPTS: u32 = 3;

// https://developers.google.com/calendar/api/v3/reference/events

/// Start or end of a Google Calendar event. All-day events carry `date`,
/// timed events carry `date_time`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEventTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEventAttendee {
    #[serde(default, rename = "self")]
    pub is_self: bool,
    pub response_status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCalendarEventItem {
    pub id: String,
    pub status: Option<String>,
    /// "transparent" events do not block time
    pub transparency: Option<String>,
    pub start: Option<GoogleEventTime>,
    pub end: Option<GoogleEventTime>,
    pub attendees: Option<Vec<GoogleEventAttendee>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsResponse {
    #[serde(default)]
    pub items: Vec<GoogleCalendarEventItem>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCalendarEventAttributes {
    pub summary: String,
    pub description: String,
    pub start: GoogleEventTime,
    pub end: GoogleEventTime,
}

#[derive(Debug, Deserialize)]
pub struct GoogleCalendarEvent {
    pub id: String,
}

pub struct GoogleCalendarRestApi {
    client: Client,
    access_token: String,
}

impl GoogleCalendarRestApi {
    pub fn new(access_token: String) -> Self {
        Self {
            client: Client::new(),
            access_token,
        }
    }

    fn classify_status(status: StatusCode) -> CalendarGatewayError {
        match status {
            StatusCode::UNAUTHORIZED => CalendarGatewayError::TokenExpired,
            StatusCode::TOO_MANY_REQUESTS => CalendarGatewayError::RateLimited,
            // Google also signals quota exhaustion through 403
            StatusCode::FORBIDDEN => CalendarGatewayError::RateLimited,
            _ => CalendarGatewayError::ProviderUnavailable,
        }
    }

    /// Run a request, retrying rate-limited responses a bounded number of
    /// times with jittered backoff. Other failures propagate immediately.
    async fn with_rate_limit_retry<F, Fut, T>(&self, mut call: F) -> Result<T, CalendarGatewayError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, CalendarGatewayError>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Err(CalendarGatewayError::RateLimited) if attempt + 1 < RATE_LIMIT_ATTEMPTS => {
                    attempt += 1;
                    let base_ms = 500u64 * (1 << attempt);
                    let jitter_ms = rand::thread_rng().gen_range(0..250u64);
                    warn!(attempt, "Google Calendar rate limited, backing off");
                    tokio::time::sleep(std::time::Duration::from_millis(base_ms + jitter_ms)).await;
                }
                other => return other,
            }
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, CalendarGatewayError> {
        let res = self
            .client
            .get(url)
            .query(query)
            .header("authorization", format!("Bearer {}", self.access_token))
            .send()
            .await
            .map_err(|e| {
                error!("[Network Error] Google Calendar API GET error: {:?}", e);
                CalendarGatewayError::ProviderUnavailable
            })?;

        let status = res.status();
        if !status.is_success() {
            error!(%status, url, "Google Calendar API GET returned an error status");
            return Err(Self::classify_status(status));
        }

        res.json::<T>().await.map_err(|e| {
            error!("[Unexpected Response] Google Calendar API GET error: {:?}", e);
            CalendarGatewayError::ProviderUnavailable
        })
    }

    /// List instances of all events overlapping `[time_min, time_max)`,
    /// recurrences expanded, following pagination.
    pub async fn list_event_instances(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<GoogleCalendarEventItem>, CalendarGatewayError> {
        let url = format!("{API_BASE_URL}/calendars/{PRIMARY_CALENDAR}/events");
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let token = page_token.clone();
            let page: ListEventsResponse = self
                .with_rate_limit_retry(|| {
                    let mut query = vec![
                        ("timeMin", time_min.to_rfc3339()),
                        ("timeMax", time_max.to_rfc3339()),
                        ("singleEvents", "true".to_string()),
                        ("maxResults", "2500".to_string()),
                    ];
                    if let Some(token) = &token {
                        query.push(("pageToken", token.clone()));
                    }
                    let url = url.clone();
                    async move { self.get_json(&url, &query).await }
                })
                .await?;

            items.extend(page.items);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(items)
    }

    pub async fn insert(
        &self,
        event: &GoogleCalendarEventAttributes,
    ) -> Result<GoogleCalendarEvent, CalendarGatewayError> {
        let url = format!("{API_BASE_URL}/calendars/{PRIMARY_CALENDAR}/events");
        self.with_rate_limit_retry(|| {
            let url = url.clone();
            async move {
                let res = self
                    .client
                    .post(&url)
                    .header("authorization", format!("Bearer {}", self.access_token))
                    .json(event)
                    .send()
                    .await
                    .map_err(|e| {
                        error!("[Network Error] Google Calendar API POST error: {:?}", e);
                        CalendarGatewayError::ProviderUnavailable
                    })?;

                let status = res.status();
                if !status.is_success() {
                    error!(%status, "Google Calendar event insert returned an error status");
                    return Err(Self::classify_status(status));
                }

                res.json::<GoogleCalendarEvent>().await.map_err(|e| {
                    error!(
                        "[Unexpected Response] Google Calendar event insert error: {:?}",
                        e
                    );
                    CalendarGatewayError::ProviderUnavailable
                })
            }
        })
        .await
    }

    pub async fn remove(&self, event_id: &str) -> Result<(), CalendarGatewayError> {
        let url = format!("{API_BASE_URL}/calendars/{PRIMARY_CALENDAR}/events/{event_id}");
        self.with_rate_limit_retry(|| {
            let url = url.clone();
            async move {
                let res = self
                    .client
                    .delete(&url)
                    .header("authorization", format!("Bearer {}", self.access_token))
                    .send()
                    .await
                    .map_err(|e| {
                        error!("[Network Error] Google Calendar API DELETE error: {:?}", e);
                        CalendarGatewayError::ProviderUnavailable
                    })?;

                let status = res.status();
                // Already deleted remotely counts as removed
                if status.is_success()
                    || status == StatusCode::NOT_FOUND
                    || status == StatusCode::GONE
                {
                    Ok(())
                } else {
                    error!(%status, "Google Calendar event delete returned an error status");
                    Err(Self::classify_status(status))
                }
            }
        })
        .await
    }
}
