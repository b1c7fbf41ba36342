use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    policy::BookingPolicyOverrides,
    shared::entity::{ExpertId, PayoutAccountId},
};

/// ISO-3166 alpha-2 country code, used for payout aging lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryCode(String);

#[derive(Error, Debug)]
#[error("'{0}' is not an ISO-2 country code")]
pub struct InvalidCountryCode(String);

impl CountryCode {
    pub fn new(code: &str) -> Result<Self, InvalidCountryCode> {
        if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code.to_ascii_uppercase()))
        } else {
            Err(InvalidCountryCode(code.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OnboardingState {
    /// Profile exists but payout account is not connected yet
    Pending,
    /// Fully onboarded, bookable
    Active,
    /// Soft-deactivated; never bookable, history retained
    Deactivated,
}

/// The service provider owning availability, offerings and payouts.
/// Experts are created externally and never destroyed, only deactivated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expert {
    pub id: ExpertId,
    pub handle: String,
    pub timezone: Tz,
    pub country: CountryCode,
    pub payout_account_id: Option<PayoutAccountId>,
    pub onboarding_state: OnboardingState,
    pub policy_overrides: BookingPolicyOverrides,
}

impl Expert {
    pub fn is_bookable(&self) -> bool {
        self.onboarding_state == OnboardingState::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_codes_normalize_to_uppercase() {
        assert_eq!(CountryCode::new("pt").unwrap().as_str(), "PT");
        assert!(CountryCode::new("PRT").is_err());
        assert!(CountryCode::new("p1").is_err());
    }

    #[test]
    fn only_active_experts_are_bookable() {
        let mut expert = Expert {
            id: ExpertId::new_v4(),
            handle: "ana".into(),
            timezone: chrono_tz::UTC,
            country: CountryCode::new("PT").unwrap(),
            payout_account_id: None,
            onboarding_state: OnboardingState::Pending,
            policy_overrides: Default::default(),
        };
        assert!(!expert.is_bookable());
        expert.onboarding_state = OnboardingState::Active;
        assert!(expert.is_bookable());
        expert.onboarding_state = OnboardingState::Deactivated;
        assert!(!expert.is_bookable());
    }
}
