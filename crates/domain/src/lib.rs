pub mod booking_slots;
mod date;
mod event;
mod expert;
mod fees;
mod interval;
mod meeting;
mod policy;
mod reservation;
mod schedule;
mod shared;
mod timespan;
mod transfer;

pub use chrono::Weekday;
pub use chrono_tz::Tz;
pub use date::{
    ceil_to_slot_grid,
    local_date,
    next_local_midnight,
    resolve_local_earliest,
    resolve_local_latest,
    start_of_local_day,
};
pub use event::{Event, MAX_EVENT_DURATION_MINUTES, MIN_EVENT_DURATION_MINUTES};
pub use expert::{CountryCode, Expert, InvalidCountryCode, OnboardingState};
pub use fees::{split_amount, FeeBreakdown, FeeRate, InvalidFeeRate};
pub use interval::{Interval, IntervalSet};
pub use meeting::{CancellationActor, Meeting, PaymentStatus};
pub use policy::{
    BookingPolicy,
    BookingPolicyOverrides,
    InvalidPolicyError,
    ALLOWED_SLOT_INTERVALS,
    MAX_BOOKING_WINDOW_DAYS,
};
pub use reservation::{Reservation, ReservationStatus};
pub use schedule::{InvalidScheduleError, Schedule, ScheduleWindow, MINUTES_PER_DAY};
pub use shared::entity::{
    CalendarEntryId,
    EventId,
    ExpertId,
    GuestIdentifier,
    InvalidIdError,
    MeetingId,
    PaymentId,
    PaymentSessionId,
    PayoutAccountId,
    ProviderEventId,
    ProviderTransferId,
    ReservationId,
    TransferId,
};
pub use timespan::TimeSpan;
pub use transfer::{
    IllegalTransferTransition,
    PaymentTransfer,
    TransferStatus,
    MAX_DISBURSE_ATTEMPTS,
};
