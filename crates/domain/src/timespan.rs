use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A `TimeSpan` type represents a half-open `[start, end)` interval of time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSpan {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

impl TimeSpan {
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    /// Duration of this `TimeSpan` is greater than a given number of minutes
    pub fn greater_than_minutes(&self, minutes: i64) -> bool {
        (self.end_time - self.start_time).num_minutes() > minutes
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end_time
    }
}
