pub(crate) mod postgres;

use chrono::{DateTime, Utc};
pub use postgres::PostgresMeetingRepo;
use soudan_domain::{
    CalendarEntryId,
    CancellationActor,
    ExpertId,
    GuestIdentifier,
    Interval,
    Meeting,
    MeetingId,
    PaymentId,
    TimeSpan,
};

#[async_trait::async_trait]
pub trait IMeetingRepo: Send + Sync {
    async fn find(&self, meeting_id: &MeetingId) -> anyhow::Result<Option<Meeting>>;
    async fn find_by_payment(&self, payment_id: &PaymentId) -> anyhow::Result<Option<Meeting>>;
    async fn find_by_expert(
        &self,
        expert_id: &ExpertId,
        range: &TimeSpan,
    ) -> anyhow::Result<Vec<Meeting>>;
    async fn find_by_guest(
        &self,
        guest: &GuestIdentifier,
        range: &TimeSpan,
    ) -> anyhow::Result<Vec<Meeting>>;
    /// Mark the meeting cancelled. Returns false when it was already
    /// cancelled (idempotent replay).
    async fn cancel(
        &self,
        meeting_id: &MeetingId,
        cancelled_at: DateTime<Utc>,
        actor: CancellationActor,
    ) -> anyhow::Result<bool>;
    async fn mark_refunded(&self, meeting_id: &MeetingId) -> anyhow::Result<()>;
    async fn set_calendar_entry(
        &self,
        meeting_id: &MeetingId,
        entry: Option<&CalendarEntryId>,
    ) -> anyhow::Result<()>;
    /// Occupied spans of live meetings, for the availability busy set
    async fn busy_intervals(
        &self,
        expert_id: &ExpertId,
        range: &TimeSpan,
    ) -> anyhow::Result<Vec<Interval>>;

    /// Live meetings starting within `[from, to)`, for reminder emission
    async fn find_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Meeting>>;
}
