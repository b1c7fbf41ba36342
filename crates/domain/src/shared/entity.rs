use std::{fmt::Display, hash::Hash, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum InvalidIdError {
    #[error("ID: {0} is malformed")]
    Malformed(String),
}

/// Declares a nominal entity id wrapping a UUID.
///
/// Each entity gets its own type so an `ExpertId` can never be passed where
/// a `ReservationId` is expected, even though both are UUIDs on the wire.
macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl From<$name> for Uuid {
            fn from(e: $name) -> Self {
                e.0
            }
        }

        impl From<Uuid> for $name {
            fn from(e: Uuid) -> Self {
                Self(e)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = InvalidIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<Uuid>()
                    .map(Self)
                    .map_err(|_| InvalidIdError::Malformed(s.to_string()))
            }
        }
    };
}

/// Declares a nominal identifier carried as an opaque string.
///
/// Used for identifiers minted by external systems (payment provider,
/// calendar provider, guest identity) where we have no structural guarantees.
macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Id of an expert (the service provider owning availability and payouts)
    ExpertId
);
uuid_id!(
    /// Id of a bookable event offering
    EventId
);
uuid_id!(
    /// Id of a short-lived slot hold
    ReservationId
);
uuid_id!(
    /// Id of a confirmed, paid meeting
    MeetingId
);
uuid_id!(
    /// Id of a payout transfer
    TransferId
);

string_id!(
    /// Stable external identifier of the paying guest
    GuestIdentifier
);
string_id!(
    /// Payment-provider account receiving the expert's payouts
    PayoutAccountId
);
string_id!(
    /// Payment-provider checkout session id
    PaymentSessionId
);
string_id!(
    /// Payment-provider capture/charge id
    PaymentId
);
string_id!(
    /// Provider-unique id of an inbound webhook event
    ProviderEventId
);
string_id!(
    /// Payment-provider transfer id assigned on disbursement
    ProviderTransferId
);
string_id!(
    /// External calendar entry created for a confirmed meeting
    CalendarEntryId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_round_trip_through_strings() {
        let id = ExpertId::new_v4();
        let parsed = id.to_string().parse::<ExpertId>().unwrap();
        assert_eq!(id, parsed);

        assert!("not-a-uuid".parse::<ExpertId>().is_err());
    }

    #[test]
    fn uuid_ids_serialize_transparently() {
        let id = MeetingId::new_v4();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }

    #[test]
    fn string_ids_preserve_their_value() {
        let guest = GuestIdentifier::new("guest_42");
        assert_eq!(guest.as_str(), "guest_42");
        assert_eq!(guest.to_string(), "guest_42");
    }
}
