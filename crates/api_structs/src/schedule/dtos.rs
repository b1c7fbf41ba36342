use serde::{Deserialize, Serialize};
use soudan_domain::{ExpertId, Schedule, ScheduleWindow};

/// A schedule is the set of weekly windows in which an expert is bookable
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDTO {
    pub expert_id: ExpertId,
    /// Timezone (e.g. "Europe/Lisbon")
    pub timezone: String,
    pub windows: Vec<ScheduleWindow>,
}

impl ScheduleDTO {
    pub fn new(schedule: Schedule) -> Self {
        Self {
            expert_id: schedule.expert_id,
            timezone: schedule.timezone.to_string(),
            windows: schedule.windows,
        }
    }
}
