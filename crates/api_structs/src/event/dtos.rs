use serde::{Deserialize, Serialize};
use soudan_domain::{Event, EventId, ExpertId};

/// Projection of a bookable offering, as shown on the booking page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDTO {
    pub id: EventId,
    pub expert_id: ExpertId,
    pub slug: String,
    pub title: String,
    pub duration_minutes: i64,
    pub active: bool,
    pub price_minor: i64,
    pub currency: String,
    pub display_order: i32,
}

impl EventDTO {
    pub fn new(event: Event) -> Self {
        Self {
            id: event.id,
            expert_id: event.expert_id,
            slug: event.slug,
            title: event.title,
            duration_minutes: event.duration_minutes,
            active: event.active,
            price_minor: event.price_minor,
            currency: event.currency,
            display_order: event.display_order,
        }
    }
}
