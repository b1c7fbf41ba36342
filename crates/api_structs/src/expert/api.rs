use serde::{Deserialize, Serialize};
use soudan_domain::ExpertId;
use validator::Validate;

pub mod oauth_integration {
    use super::*;

    /// Request body for connecting the expert's external calendar
    #[derive(Debug, Deserialize, Serialize, Validate)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        /// OAuth authorization code from the provider's consent redirect
        #[validate(length(min = 1))]
        pub code: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct PathParams {
        pub expert_id: ExpertId,
    }
}

pub mod remove_integration {
    use super::*;

    #[derive(Debug, Deserialize)]
    pub struct PathParams {
        pub expert_id: ExpertId,
    }
}
