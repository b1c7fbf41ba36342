use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use soudan_domain::{ExpertId, MeetingId};
use validator::Validate;

use crate::dtos::MeetingDTO;

pub mod get_meetings {
    use super::*;

    /// Exactly one of `expert_id` / `guest_identifier` must be given
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct QueryParams {
        #[serde(default)]
        pub expert_id: Option<ExpertId>,
        #[serde(default)]
        pub guest_identifier: Option<String>,
        pub from: DateTime<Utc>,
        pub to: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub meetings: Vec<MeetingDTO>,
    }
}

pub mod cancel_meeting {
    use super::*;

    #[derive(Debug, Deserialize)]
    pub struct PathParams {
        pub meeting_id: MeetingId,
    }

    #[derive(Debug, Deserialize, Serialize, Validate)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        #[validate(length(min = 1, max = 500))]
        pub reason: String,
        /// Who asked for the cancellation: "expert", "guest" or "system".
        /// Defaults to the guest, the common self-service path
        #[serde(default)]
        pub actor: Option<String>,
    }
}
