use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use soudan_domain::{EventId, ExpertId, Meeting, MeetingId, PaymentStatus};

/// Projection of a confirmed meeting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingDTO {
    pub id: MeetingId,
    pub event_id: EventId,
    pub expert_id: ExpertId,
    pub guest_identifier: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub guest_timezone: String,
    pub location_handle: String,
    pub guest_notes: Option<String>,
    pub payment_status: PaymentStatus,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl MeetingDTO {
    pub fn new(meeting: Meeting) -> Self {
        Self {
            id: meeting.id,
            event_id: meeting.event_id,
            expert_id: meeting.expert_id,
            guest_identifier: meeting.guest.to_string(),
            start_time: meeting.start_time,
            end_time: meeting.end_time,
            guest_timezone: meeting.guest_timezone.to_string(),
            location_handle: meeting.location_handle,
            guest_notes: meeting.guest_notes,
            payment_status: meeting.payment_status,
            cancelled_at: meeting.cancelled_at,
        }
    }
}
