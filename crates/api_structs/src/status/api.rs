use serde::{Deserialize, Serialize};

pub mod get_service_health {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct APIResponse {
        pub message: String,
    }
}

pub mod run_job {
    use super::*;

    /// Outcome of a cron-triggered sweep. `failures > 0` maps to the
    /// partial-success exit semantics of the operational surface.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub processed: u64,
        pub failures: u64,
    }
}
