use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use soudan_domain::{EventId, ExpertId};

pub mod get_availability {
    use super::*;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct QueryParams {
        pub expert_id: ExpertId,
        pub event_id: EventId,
    }

    /// The bookable start instants for one expert/event pair, UTC, ascending
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        /// The expert's home timezone, for rendering local times
        pub timezone: String,
        pub candidates: Vec<DateTime<Utc>>,
    }
}
