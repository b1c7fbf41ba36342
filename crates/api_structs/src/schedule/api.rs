use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use soudan_domain::{ExpertId, ScheduleWindow};

use crate::dtos::ScheduleDTO;

pub mod get_schedule {
    use super::*;

    #[derive(Debug, Deserialize)]
    pub struct PathParams {
        pub expert_id: ExpertId,
    }

    pub type APIResponse = ScheduleDTO;
}

pub mod save_schedule {
    use super::*;

    #[derive(Debug, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        /// Timezone name; when absent the stored timezone is kept
        #[serde(default)]
        pub timezone: Option<String>,
        pub windows: Vec<ScheduleWindow>,
    }

    #[derive(Debug, Deserialize)]
    pub struct PathParams {
        pub expert_id: ExpertId,
    }

    pub type APIResponse = ScheduleDTO;
}

pub mod list_blocked_dates {
    use super::*;

    #[derive(Debug, Deserialize)]
    pub struct PathParams {
        pub expert_id: ExpertId,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct QueryParams {
        pub from: NaiveDate,
        pub to: NaiveDate,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub dates: Vec<NaiveDate>,
    }
}

pub mod add_blocked_date {
    use super::*;

    #[derive(Debug, Deserialize)]
    pub struct PathParams {
        pub expert_id: ExpertId,
    }

    #[derive(Debug, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub date: NaiveDate,
    }
}

pub mod remove_blocked_date {
    use super::*;

    #[derive(Debug, Deserialize)]
    pub struct PathParams {
        pub expert_id: ExpertId,
        pub date: NaiveDate,
    }
}
