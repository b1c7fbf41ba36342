use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::shared::entity::{EventId, ExpertId};

pub const MIN_EVENT_DURATION_MINUTES: i64 = 5;
pub const MAX_EVENT_DURATION_MINUTES: i64 = 720;

/// A bookable offering owned by an expert: what guests actually book.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub expert_id: ExpertId,
    /// Unique per expert, used in booking page URLs
    #[validate(length(min = 1, max = 100))]
    pub slug: String,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(range(min = 5, max = 720))]
    pub duration_minutes: i64,
    pub active: bool,
    /// Price in currency minor units
    #[validate(range(min = 0))]
    pub price_minor: i64,
    /// ISO-4217 currency code, carried verbatim, never converted
    #[validate(length(equal = 3))]
    pub currency: String,
    pub display_order: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> Event {
        Event {
            id: EventId::new_v4(),
            expert_id: ExpertId::new_v4(),
            slug: "intro-call".into(),
            title: "Intro call".into(),
            duration_minutes: 60,
            active: true,
            price_minor: 10000,
            currency: "EUR".into(),
            display_order: 0,
        }
    }

    #[test]
    fn accepts_a_sane_event() {
        assert!(event().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_durations() {
        let mut e = event();
        e.duration_minutes = 4;
        assert!(e.validate().is_err());
        e.duration_minutes = 721;
        assert!(e.validate().is_err());
        e.duration_minutes = 720;
        assert!(e.validate().is_ok());
    }

    #[test]
    fn rejects_malformed_currency() {
        let mut e = event();
        e.currency = "EURO".into();
        assert!(e.validate().is_err());
    }
}
