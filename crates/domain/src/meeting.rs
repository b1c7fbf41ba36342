use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use soudan_utils::create_random_secret;

use crate::{
    interval::Interval,
    shared::entity::{
        CalendarEntryId,
        EventId,
        ExpertId,
        GuestIdentifier,
        MeetingId,
        PaymentId,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentStatus {
    /// Funds captured by the provider; the meeting exists because of this
    Captured,
    /// Refunded after a cancellation
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Captured => "captured",
            Self::Refunded => "refunded",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "captured" => Some(Self::Captured),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CancellationActor {
    Expert,
    Guest,
    System,
}

impl CancellationActor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expert => "expert",
            Self::Guest => "guest",
            Self::System => "system",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "expert" => Some(Self::Expert),
            "guest" => Some(Self::Guest),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

/// A confirmed, paid booking. One-to-one with a CONFIRMED reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: MeetingId,
    pub event_id: EventId,
    pub expert_id: ExpertId,
    pub guest: GuestIdentifier,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub guest_timezone: Tz,
    /// Opaque handle of the video room guests and expert join
    pub location_handle: String,
    pub guest_notes: Option<String>,
    pub payment_id: PaymentId,
    pub payment_status: PaymentStatus,
    pub external_calendar_entry_id: Option<CalendarEntryId>,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_actor: Option<CancellationActor>,
}

impl Meeting {
    pub fn generate_location_handle() -> String {
        format!("room-{}", create_random_secret(12).to_lowercase())
    }

    pub fn interval(&self) -> Option<Interval> {
        Interval::new(self.start_time, self.end_time)
    }

    /// An active meeting keeps its slot occupied; a cancelled one frees it.
    pub fn blocks_slot(&self) -> bool {
        self.cancelled_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_meetings_release_their_slot() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let mut meeting = Meeting {
            id: MeetingId::new_v4(),
            event_id: EventId::new_v4(),
            expert_id: ExpertId::new_v4(),
            guest: GuestIdentifier::new("guest_1"),
            start_time: now,
            end_time: now + chrono::Duration::hours(1),
            guest_timezone: chrono_tz::UTC,
            location_handle: Meeting::generate_location_handle(),
            guest_notes: None,
            payment_id: PaymentId::new("pi_123"),
            payment_status: PaymentStatus::Captured,
            external_calendar_entry_id: None,
            created_at: now,
            cancelled_at: None,
            cancellation_actor: None,
        };
        assert!(meeting.blocks_slot());

        meeting.cancelled_at = Some(now);
        meeting.cancellation_actor = Some(CancellationActor::Guest);
        assert!(!meeting.blocks_slot());
    }

    #[test]
    fn location_handles_are_distinct() {
        let a = Meeting::generate_location_handle();
        let b = Meeting::generate_location_handle();
        assert!(a.starts_with("room-"));
        assert_ne!(a, b);
    }
}
