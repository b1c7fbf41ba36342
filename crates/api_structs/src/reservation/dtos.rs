use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use soudan_domain::{
    EventId,
    ExpertId,
    Reservation,
    ReservationId,
    ReservationStatus,
};

/// Projection of a slot hold returned to the booking frontend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDTO {
    pub id: ReservationId,
    pub event_id: EventId,
    pub expert_id: ExpertId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: ReservationStatus,
}

impl ReservationDTO {
    pub fn new(reservation: Reservation) -> Self {
        Self {
            id: reservation.id,
            event_id: reservation.event_id,
            expert_id: reservation.expert_id,
            start_time: reservation.start_time,
            end_time: reservation.end_time,
            expires_at: reservation.expires_at,
            status: reservation.status,
        }
    }
}
