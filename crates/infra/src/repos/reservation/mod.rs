mod postgres;

use chrono::{DateTime, Utc};
pub use postgres::PostgresReservationRepo;
use soudan_domain::{
    ExpertId,
    Interval,
    Meeting,
    PaymentSessionId,
    Reservation,
    ReservationId,
    TimeSpan,
};

/// Result of attempting to insert a hold under the expert's exclusion guard.
#[derive(Debug)]
pub enum HoldOutcome {
    Inserted,
    /// Some live hold or meeting already overlaps the requested span
    Conflict,
}

/// Result of an idempotent confirmation.
#[derive(Debug)]
pub enum ConfirmOutcome {
    /// Reservation moved HELD -> CONFIRMED and the meeting was created
    Confirmed(Meeting),
    /// Replay: already confirmed against the same captured payment
    AlreadyConfirmed(Meeting),
    /// Confirmed earlier against a different payment, or the meeting slot
    /// was taken by the unique-slot guard
    MeetingConflict,
    /// Past expires_at (or already expired/cancelled); caller refunds
    Expired,
    NotFound,
}

#[async_trait::async_trait]
pub trait IReservationRepo: Send + Sync {
    /// Insert a hold, guarded against overlapping live holds and meetings
    /// for the same expert inside one linearization (advisory lock keyed by
    /// the expert plus the overlap check run in the same transaction).
    async fn insert_hold(
        &self,
        reservation: &Reservation,
        now: DateTime<Utc>,
    ) -> anyhow::Result<HoldOutcome>;

    async fn attach_payment_session(
        &self,
        reservation_id: &ReservationId,
        session_id: &PaymentSessionId,
    ) -> anyhow::Result<()>;

    /// Atomically confirm the reservation and create its meeting.
    async fn confirm(
        &self,
        reservation_id: &ReservationId,
        meeting: &Meeting,
        now: DateTime<Utc>,
    ) -> anyhow::Result<ConfirmOutcome>;

    /// HELD -> CANCELLED. Returns false on terminal states (no-op).
    async fn abort(&self, reservation_id: &ReservationId) -> anyhow::Result<bool>;

    /// Flip HELD rows past their deadline to EXPIRED and return them, so
    /// the caller can expire their payment sessions.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<Reservation>>;

    async fn find(&self, reservation_id: &ReservationId) -> anyhow::Result<Option<Reservation>>;

    async fn find_by_payment_session(
        &self,
        session_id: &PaymentSessionId,
    ) -> anyhow::Result<Option<Reservation>>;

    /// Flag a voucher-style pending payment and extend the deadline.
    /// Never shortens an existing deadline; false when the hold is gone.
    async fn mark_pending_voucher(
        &self,
        reservation_id: &ReservationId,
        extended_expires_at: DateTime<Utc>,
    ) -> anyhow::Result<bool>;

    /// Spans of live holds, for the availability busy set
    async fn busy_intervals(
        &self,
        expert_id: &ExpertId,
        range: &TimeSpan,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Interval>>;
}
