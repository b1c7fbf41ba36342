use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use soudan_domain::{EventId, ReservationId};
use validator::Validate;

pub mod hold_reservation {
    use super::*;

    /// Request body for holding a slot while the guest pays
    #[derive(Debug, Deserialize, Serialize, Validate)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub event_id: EventId,
        /// Candidate start instant previously returned by the availability
        /// endpoint, UTC
        pub start_instant: DateTime<Utc>,
        /// Stable external identifier of the paying guest
        #[validate(length(min = 1, max = 200))]
        pub guest_identifier: String,
        /// IANA timezone of the guest, for rendering local meeting times.
        /// Defaults to UTC when absent
        #[serde(default)]
        pub guest_timezone: Option<String>,
        #[serde(default)]
        #[validate(length(max = 2000))]
        pub guest_notes: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub reservation_id: ReservationId,
        /// Where to send the guest to pay
        pub payment_redirect_url: String,
        pub expires_at: DateTime<Utc>,
    }
}

pub mod get_reservation {
    use super::*;
    use crate::dtos::ReservationDTO;

    #[derive(Debug, Deserialize)]
    pub struct PathParams {
        pub reservation_id: ReservationId,
    }

    pub type APIResponse = ReservationDTO;
}

pub mod abort_reservation {
    use super::*;

    #[derive(Debug, Deserialize)]
    pub struct PathParams {
        pub reservation_id: ReservationId,
    }
}
