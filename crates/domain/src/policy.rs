use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Slot grid intervals a policy may choose from, in minutes.
pub const ALLOWED_SLOT_INTERVALS: [i64; 9] = [5, 10, 15, 20, 30, 45, 60, 90, 120];

pub const MAX_BOOKING_WINDOW_DAYS: i64 = 365;

/// Per-expert booking policy. All durations are minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPolicy {
    /// Grid step between two candidate start instants
    pub time_slot_interval: i64,
    /// How many days ahead a guest can book
    pub booking_window_days: i64,
    /// Minimum notice before a booking can start
    pub minimum_notice: i64,
    /// Kept free before each meeting
    pub before_event_buffer: i64,
    /// Kept free after each meeting
    pub after_event_buffer: i64,
}

/// Per-expert overrides of the platform defaults. Unset fields fall back to
/// the configured default policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPolicyOverrides {
    pub time_slot_interval: Option<i64>,
    pub booking_window_days: Option<i64>,
    pub minimum_notice: Option<i64>,
    pub before_event_buffer: Option<i64>,
    pub after_event_buffer: Option<i64>,
}

#[derive(Error, Debug, PartialEq)]
pub enum InvalidPolicyError {
    #[error("Slot interval {0} is not one of the allowed values {ALLOWED_SLOT_INTERVALS:?}")]
    SlotInterval(i64),
    #[error("Booking window of {0} days is outside [1, {MAX_BOOKING_WINDOW_DAYS}]")]
    BookingWindow(i64),
    #[error("Negative duration for {field}: {value}")]
    NegativeDuration { field: &'static str, value: i64 },
}

impl BookingPolicy {
    pub fn validate(&self) -> Result<(), InvalidPolicyError> {
        if !ALLOWED_SLOT_INTERVALS.contains(&self.time_slot_interval) {
            return Err(InvalidPolicyError::SlotInterval(self.time_slot_interval));
        }
        if !(1..=MAX_BOOKING_WINDOW_DAYS).contains(&self.booking_window_days) {
            return Err(InvalidPolicyError::BookingWindow(self.booking_window_days));
        }
        for (field, value) in [
            ("minimumNotice", self.minimum_notice),
            ("beforeEventBuffer", self.before_event_buffer),
            ("afterEventBuffer", self.after_event_buffer),
        ] {
            if value < 0 {
                return Err(InvalidPolicyError::NegativeDuration { field, value });
            }
        }
        Ok(())
    }

    /// Apply per-expert overrides on top of the platform defaults.
    pub fn with_overrides(self, overrides: &BookingPolicyOverrides) -> Self {
        Self {
            time_slot_interval: overrides.time_slot_interval.unwrap_or(self.time_slot_interval),
            booking_window_days: overrides
                .booking_window_days
                .unwrap_or(self.booking_window_days),
            minimum_notice: overrides.minimum_notice.unwrap_or(self.minimum_notice),
            before_event_buffer: overrides
                .before_event_buffer
                .unwrap_or(self.before_event_buffer),
            after_event_buffer: overrides
                .after_event_buffer
                .unwrap_or(self.after_event_buffer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> BookingPolicy {
        BookingPolicy {
            time_slot_interval: 30,
            booking_window_days: 14,
            minimum_notice: 60,
            before_event_buffer: 0,
            after_event_buffer: 0,
        }
    }

    #[test]
    fn accepts_a_sane_policy() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn rejects_off_grid_intervals() {
        let mut policy = base();
        policy.time_slot_interval = 25;
        assert_eq!(policy.validate(), Err(InvalidPolicyError::SlotInterval(25)));
    }

    #[test]
    fn rejects_out_of_range_windows() {
        let mut policy = base();
        policy.booking_window_days = 0;
        assert!(policy.validate().is_err());
        policy.booking_window_days = 366;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn overrides_fill_only_what_they_set() {
        let overrides = BookingPolicyOverrides {
            minimum_notice: Some(120),
            ..Default::default()
        };
        let resolved = base().with_overrides(&overrides);
        assert_eq!(resolved.minimum_notice, 120);
        assert_eq!(resolved.time_slot_interval, 30);
    }
}
