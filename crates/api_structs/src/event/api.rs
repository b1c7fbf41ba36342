use serde::{Deserialize, Serialize};
use soudan_domain::ExpertId;

use crate::dtos::EventDTO;

pub mod get_events {
    use super::*;

    #[derive(Debug, Deserialize)]
    pub struct PathParams {
        pub expert_id: ExpertId,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct QueryParams {
        /// Return the single offering with this slug instead of the list
        #[serde(default)]
        pub slug: Option<String>,
        /// Include inactive offerings (expert dashboard view)
        #[serde(default)]
        pub include_inactive: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub events: Vec<EventDTO>,
    }
}
