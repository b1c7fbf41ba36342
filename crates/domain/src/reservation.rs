use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{
    interval::Interval,
    shared::entity::{EventId, ExpertId, GuestIdentifier, PaymentSessionId, ReservationId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Held,
    Confirmed,
    Expired,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Held => "held",
            Self::Confirmed => "confirmed",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "held" => Some(Self::Held),
            "confirmed" => Some(Self::Confirmed),
            "expired" => Some(Self::Expired),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Terminal with respect to holds: no further transition is observable.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Held)
    }
}

/// A short-lived exclusive hold on a slot while the guest pays.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: ReservationId,
    pub event_id: EventId,
    pub expert_id: ExpertId,
    pub guest: GuestIdentifier,
    /// Captured at hold time so the meeting can render guest-local times
    pub guest_timezone: Tz,
    pub guest_notes: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub payment_session_id: Option<PaymentSessionId>,
    /// Set when a voucher-style payment is in flight; such holds live on a
    /// longer grace window than the card TTL
    pub pending_voucher: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: ReservationStatus,
}

impl Reservation {
    pub fn interval(&self) -> Option<Interval> {
        Interval::new(self.start_time, self.end_time)
    }

    /// A HELD reservation past `expires_at` is logically expired even
    /// before the sweep has run.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == ReservationStatus::Held && self.expires_at <= now
    }

    /// Whether this reservation still excludes other guests from its slot.
    pub fn holds_slot(&self, now: DateTime<Utc>) -> bool {
        self.status == ReservationStatus::Held && now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn reservation(now: DateTime<Utc>) -> Reservation {
        Reservation {
            id: ReservationId::new_v4(),
            event_id: EventId::new_v4(),
            expert_id: ExpertId::new_v4(),
            guest: GuestIdentifier::new("guest_1"),
            guest_timezone: chrono_tz::UTC,
            guest_notes: None,
            start_time: now + Duration::hours(2),
            end_time: now + Duration::hours(3),
            payment_session_id: None,
            pending_voucher: false,
            created_at: now,
            expires_at: now + Duration::minutes(30),
            status: ReservationStatus::Held,
        }
    }

    #[test]
    fn held_reservation_expires_logically_at_the_deadline() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let r = reservation(now);

        assert!(!r.is_expired(now));
        assert!(r.holds_slot(now));

        let at_deadline = now + Duration::minutes(30);
        assert!(r.is_expired(at_deadline));
        assert!(!r.holds_slot(at_deadline));
    }

    #[test]
    fn terminal_statuses_do_not_hold_slots() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        for status in [
            ReservationStatus::Confirmed,
            ReservationStatus::Expired,
            ReservationStatus::Cancelled,
        ] {
            let mut r = reservation(now);
            r.status = status;
            assert!(status.is_terminal());
            assert!(!r.holds_slot(now));
            assert!(!r.is_expired(now + Duration::hours(1)));
        }
        assert!(!ReservationStatus::Held.is_terminal());
    }

    #[test]
    fn status_round_trips_through_db_strings() {
        for status in [
            ReservationStatus::Held,
            ReservationStatus::Confirmed,
            ReservationStatus::Expired,
            ReservationStatus::Cancelled,
        ] {
            assert_eq!(ReservationStatus::from_db(status.as_str()), Some(status));
        }
        assert_eq!(ReservationStatus::from_db("unknown"), None);
    }
}
