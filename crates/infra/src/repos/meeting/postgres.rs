use std::convert::TryFrom;

use chrono::{DateTime, Utc};
use soudan_domain::{
    CalendarEntryId,
    CancellationActor,
    ExpertId,
    GuestIdentifier,
    Interval,
    Meeting,
    MeetingId,
    PaymentId,
    PaymentStatus,
    TimeSpan,
};
use sqlx::{types::Uuid, FromRow, PgPool, Postgres};
use tracing::{error, instrument};

use super::IMeetingRepo;

#[derive(Debug)]
pub struct PostgresMeetingRepo {
    pool: PgPool,
}

impl PostgresMeetingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct MeetingRaw {
    meeting_uid: Uuid,
    event_uid: Uuid,
    expert_uid: Uuid,
    guest_identifier: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    guest_timezone: String,
    location_handle: String,
    guest_notes: Option<String>,
    payment_id: String,
    payment_status: String,
    external_calendar_entry_id: Option<String>,
    created_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
    cancellation_actor: Option<String>,
}

impl TryFrom<MeetingRaw> for Meeting {
    type Error = anyhow::Error;

    fn try_from(m: MeetingRaw) -> anyhow::Result<Self> {
        let payment_status = PaymentStatus::from_db(&m.payment_status)
            .ok_or_else(|| anyhow::anyhow!("Unknown payment status in database: {}", m.payment_status))?;
        let cancellation_actor = m
            .cancellation_actor
            .as_deref()
            .map(|actor| {
                CancellationActor::from_db(actor)
                    .ok_or_else(|| anyhow::anyhow!("Unknown cancellation actor in database: {actor}"))
            })
            .transpose()?;
        Ok(Self {
            id: m.meeting_uid.into(),
            event_id: m.event_uid.into(),
            expert_id: m.expert_uid.into(),
            guest: GuestIdentifier::new(m.guest_identifier),
            start_time: m.start_time,
            end_time: m.end_time,
            guest_timezone: m
                .guest_timezone
                .parse()
                .map_err(|tz| anyhow::anyhow!("Invalid guest timezone in database: {tz}"))?,
            location_handle: m.location_handle,
            guest_notes: m.guest_notes,
            payment_id: PaymentId::new(m.payment_id),
            payment_status,
            external_calendar_entry_id: m.external_calendar_entry_id.map(CalendarEntryId::new),
            created_at: m.created_at,
            cancelled_at: m.cancelled_at,
            cancellation_actor,
        })
    }
}

/// Insert a meeting row on the given executor. Only the reservation
/// confirmation transaction calls this: a meeting exists exactly when its
/// reservation was confirmed against a captured payment.
pub(crate) async fn insert_meeting<'e, E>(executor: E, meeting: &Meeting) -> sqlx::Result<()>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO meetings(
            meeting_uid, event_uid, expert_uid, guest_identifier,
            start_time, end_time, guest_timezone, location_handle,
            guest_notes, payment_id, payment_status,
            external_calendar_entry_id, created_at, cancelled_at, cancellation_actor
        )
        VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        "#,
    )
    .bind(meeting.id.as_ref())
    .bind(meeting.event_id.as_ref())
    .bind(meeting.expert_id.as_ref())
    .bind(meeting.guest.as_str())
    .bind(meeting.start_time)
    .bind(meeting.end_time)
    .bind(meeting.guest_timezone.to_string())
    .bind(&meeting.location_handle)
    .bind(meeting.guest_notes.as_ref())
    .bind(meeting.payment_id.as_str())
    .bind(meeting.payment_status.as_str())
    .bind(
        meeting
            .external_calendar_entry_id
            .as_ref()
            .map(|e| e.as_str()),
    )
    .bind(meeting.created_at)
    .bind(meeting.cancelled_at)
    .bind(meeting.cancellation_actor.map(|a| a.as_str()))
    .execute(executor)
    .await
    .map(|_| ())
}

#[derive(Debug, FromRow)]
struct IntervalRaw {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

#[async_trait::async_trait]
impl IMeetingRepo for PostgresMeetingRepo {
    #[instrument(name = "meeting::find", skip(self))]
    async fn find(&self, meeting_id: &MeetingId) -> anyhow::Result<Option<Meeting>> {
        sqlx::query_as::<_, MeetingRaw>(
            r#"
            SELECT m.* FROM meetings AS m
            WHERE m.meeting_uid = $1
            "#,
        )
        .bind(meeting_id.as_ref())
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                meeting_id = %meeting_id,
                error = ?e,
                "Failed to find meeting"
            );
        })?
        .map(Meeting::try_from)
        .transpose()
    }

    #[instrument(name = "meeting::find_by_payment", skip(self))]
    async fn find_by_payment(&self, payment_id: &PaymentId) -> anyhow::Result<Option<Meeting>> {
        sqlx::query_as::<_, MeetingRaw>(
            r#"
            SELECT m.* FROM meetings AS m
            WHERE m.payment_id = $1
            "#,
        )
        .bind(payment_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                payment_id = %payment_id,
                error = ?e,
                "Failed to find meeting by payment"
            );
        })?
        .map(Meeting::try_from)
        .transpose()
    }

    #[instrument(name = "meeting::find_by_expert", skip(self, range))]
    async fn find_by_expert(
        &self,
        expert_id: &ExpertId,
        range: &TimeSpan,
    ) -> anyhow::Result<Vec<Meeting>> {
        sqlx::query_as::<_, MeetingRaw>(
            r#"
            SELECT m.* FROM meetings AS m
            WHERE m.expert_uid = $1 AND m.start_time < $3 AND m.end_time > $2
            ORDER BY m.start_time
            "#,
        )
        .bind(expert_id.as_ref())
        .bind(range.start())
        .bind(range.end())
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                expert_id = %expert_id,
                error = ?e,
                "Failed to find meetings for expert"
            );
        })?
        .into_iter()
        .map(Meeting::try_from)
        .collect()
    }

    #[instrument(name = "meeting::find_by_guest", skip(self, range))]
    async fn find_by_guest(
        &self,
        guest: &GuestIdentifier,
        range: &TimeSpan,
    ) -> anyhow::Result<Vec<Meeting>> {
        sqlx::query_as::<_, MeetingRaw>(
            r#"
            SELECT m.* FROM meetings AS m
            WHERE m.guest_identifier = $1 AND m.start_time < $3 AND m.end_time > $2
            ORDER BY m.start_time
            "#,
        )
        .bind(guest.as_str())
        .bind(range.start())
        .bind(range.end())
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                guest = %guest,
                error = ?e,
                "Failed to find meetings for guest"
            );
        })?
        .into_iter()
        .map(Meeting::try_from)
        .collect()
    }

    #[instrument(name = "meeting::cancel", skip(self))]
    async fn cancel(
        &self,
        meeting_id: &MeetingId,
        cancelled_at: DateTime<Utc>,
        actor: CancellationActor,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE meetings
            SET cancelled_at = $2,
                cancellation_actor = $3
            WHERE meeting_uid = $1 AND cancelled_at IS NULL
            "#,
        )
        .bind(meeting_id.as_ref())
        .bind(cancelled_at)
        .bind(actor.as_str())
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                meeting_id = %meeting_id,
                error = ?e,
                "Failed to cancel meeting"
            );
        })?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(name = "meeting::mark_refunded", skip(self))]
    async fn mark_refunded(&self, meeting_id: &MeetingId) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE meetings
            SET payment_status = 'refunded'
            WHERE meeting_uid = $1
            "#,
        )
        .bind(meeting_id.as_ref())
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                meeting_id = %meeting_id,
                error = ?e,
                "Failed to mark meeting refunded"
            );
        })?;
        Ok(())
    }

    #[instrument(name = "meeting::set_calendar_entry", skip(self, entry))]
    async fn set_calendar_entry(
        &self,
        meeting_id: &MeetingId,
        entry: Option<&CalendarEntryId>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE meetings
            SET external_calendar_entry_id = $2
            WHERE meeting_uid = $1
            "#,
        )
        .bind(meeting_id.as_ref())
        .bind(entry.map(|e| e.as_str()))
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                meeting_id = %meeting_id,
                error = ?e,
                "Failed to set calendar entry on meeting"
            );
        })?;
        Ok(())
    }

    #[instrument(name = "meeting::find_starting_between", skip(self))]
    async fn find_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Meeting>> {
        sqlx::query_as::<_, MeetingRaw>(
            r#"
            SELECT m.* FROM meetings AS m
            WHERE m.cancelled_at IS NULL
              AND m.start_time >= $1 AND m.start_time < $2
            ORDER BY m.start_time
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| {
            error!(error = ?e, "Failed to find meetings starting in range");
        })?
        .into_iter()
        .map(Meeting::try_from)
        .collect()
    }

    #[instrument(name = "meeting::busy_intervals", skip(self, range))]
    async fn busy_intervals(
        &self,
        expert_id: &ExpertId,
        range: &TimeSpan,
    ) -> anyhow::Result<Vec<Interval>> {
        let rows = sqlx::query_as::<_, IntervalRaw>(
            r#"
            SELECT m.start_time, m.end_time FROM meetings AS m
            WHERE m.expert_uid = $1 AND m.cancelled_at IS NULL
              AND m.start_time < $3 AND m.end_time > $2
            "#,
        )
        .bind(expert_id.as_ref())
        .bind(range.start())
        .bind(range.end())
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                expert_id = %expert_id,
                error = ?e,
                "Failed to load meeting busy intervals"
            );
        })?;

        Ok(rows
            .into_iter()
            .filter_map(|r| Interval::new(r.start_time, r.end_time))
            .collect())
    }
}
