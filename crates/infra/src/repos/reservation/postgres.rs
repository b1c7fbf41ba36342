use std::convert::TryFrom;

use chrono::{DateTime, Utc};
use soudan_domain::{
    ExpertId,
    GuestIdentifier,
    Interval,
    Meeting,
    PaymentSessionId,
    Reservation,
    ReservationId,
    ReservationStatus,
    TimeSpan,
};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::{error, instrument, warn};

use super::{ConfirmOutcome, HoldOutcome, IReservationRepo};
use crate::repos::meeting::postgres::{insert_meeting, MeetingRaw};

const UNIQUE_VIOLATION: &str = "23505";

pub struct PostgresReservationRepo {
    pool: PgPool,
}

impl PostgresReservationRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ReservationRaw {
    reservation_uid: Uuid,
    event_uid: Uuid,
    expert_uid: Uuid,
    guest_identifier: String,
    guest_timezone: String,
    guest_notes: Option<String>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    payment_session_id: Option<String>,
    pending_voucher: bool,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    status: String,
}

impl TryFrom<ReservationRaw> for Reservation {
    type Error = anyhow::Error;

    fn try_from(r: ReservationRaw) -> anyhow::Result<Self> {
        let status = ReservationStatus::from_db(&r.status)
            .ok_or_else(|| anyhow::anyhow!("Unknown reservation status in database: {}", r.status))?;
        Ok(Self {
            id: r.reservation_uid.into(),
            event_id: r.event_uid.into(),
            expert_id: r.expert_uid.into(),
            guest: GuestIdentifier::new(r.guest_identifier),
            guest_timezone: r
                .guest_timezone
                .parse()
                .map_err(|tz| anyhow::anyhow!("Invalid guest timezone in database: {tz}"))?,
            guest_notes: r.guest_notes,
            start_time: r.start_time,
            end_time: r.end_time,
            payment_session_id: r.payment_session_id.map(PaymentSessionId::new),
            pending_voucher: r.pending_voucher,
            created_at: r.created_at,
            expires_at: r.expires_at,
            status,
        })
    }
}

#[derive(Debug, FromRow)]
struct IntervalRaw {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

#[async_trait::async_trait]
impl IReservationRepo for PostgresReservationRepo {
    #[instrument(name = "reservation::insert_hold", skip(self, reservation), fields(reservation_id = %reservation.id, expert_id = %reservation.expert_id))]
    async fn insert_hold(
        &self,
        reservation: &Reservation,
        now: DateTime<Utc>,
    ) -> anyhow::Result<HoldOutcome> {
        let mut tx = self.pool.begin().await?;

        // Serialize concurrent hold attempts per expert for the rest of
        // this transaction; the overlap check below is then race-free.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(reservation.expert_id.to_string())
            .execute(&mut *tx)
            .await
            .inspect_err(|e| {
                error!(
                    expert_id = %reservation.expert_id,
                    error = ?e,
                    "Failed to take expert hold lock"
                );
            })?;

        let occupied: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM reservations AS r
                WHERE r.expert_uid = $1 AND r.status = 'held' AND r.expires_at > $2
                  AND r.start_time < $4 AND r.end_time > $3
            ) OR EXISTS(
                SELECT 1 FROM meetings AS m
                WHERE m.expert_uid = $1 AND m.cancelled_at IS NULL
                  AND m.start_time < $4 AND m.end_time > $3
            )
            "#,
        )
        .bind(reservation.expert_id.as_ref())
        .bind(now)
        .bind(reservation.start_time)
        .bind(reservation.end_time)
        .fetch_one(&mut *tx)
        .await
        .inspect_err(|e| {
            error!(
                expert_id = %reservation.expert_id,
                error = ?e,
                "Failed to run hold overlap check"
            );
        })?;

        if occupied {
            tx.rollback().await?;
            return Ok(HoldOutcome::Conflict);
        }

        sqlx::query(
            r#"
            INSERT INTO reservations(
                reservation_uid, event_uid, expert_uid, guest_identifier,
                guest_timezone, guest_notes,
                start_time, end_time, payment_session_id, pending_voucher,
                created_at, expires_at, status
            )
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(reservation.id.as_ref())
        .bind(reservation.event_id.as_ref())
        .bind(reservation.expert_id.as_ref())
        .bind(reservation.guest.as_str())
        .bind(reservation.guest_timezone.to_string())
        .bind(reservation.guest_notes.as_ref())
        .bind(reservation.start_time)
        .bind(reservation.end_time)
        .bind(
            reservation
                .payment_session_id
                .as_ref()
                .map(|s| s.as_str()),
        )
        .bind(reservation.pending_voucher)
        .bind(reservation.created_at)
        .bind(reservation.expires_at)
        .bind(reservation.status.as_str())
        .execute(&mut *tx)
        .await
        .inspect_err(|e| {
            error!(
                reservation_id = %reservation.id,
                error = ?e,
                "Failed to insert reservation"
            );
        })?;

        tx.commit().await?;
        Ok(HoldOutcome::Inserted)
    }

    #[instrument(name = "reservation::attach_payment_session", skip(self, session_id))]
    async fn attach_payment_session(
        &self,
        reservation_id: &ReservationId,
        session_id: &PaymentSessionId,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE reservations
            SET payment_session_id = $2
            WHERE reservation_uid = $1
            "#,
        )
        .bind(reservation_id.as_ref())
        .bind(session_id.as_str())
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                reservation_id = %reservation_id,
                error = ?e,
                "Failed to attach payment session"
            );
        })?;
        Ok(())
    }

    #[instrument(name = "reservation::confirm", skip(self, meeting), fields(meeting_id = %meeting.id))]
    async fn confirm(
        &self,
        reservation_id: &ReservationId,
        meeting: &Meeting,
        now: DateTime<Utc>,
    ) -> anyhow::Result<ConfirmOutcome> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ReservationRaw>(
            r#"
            SELECT r.* FROM reservations AS r
            WHERE r.reservation_uid = $1
            FOR UPDATE
            "#,
        )
        .bind(reservation_id.as_ref())
        .fetch_optional(&mut *tx)
        .await
        .inspect_err(|e| {
            error!(
                reservation_id = %reservation_id,
                error = ?e,
                "Failed to load reservation for confirmation"
            );
        })?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(ConfirmOutcome::NotFound);
        };
        let reservation = Reservation::try_from(row)?;

        match reservation.status {
            ReservationStatus::Confirmed => {
                tx.rollback().await?;
                let existing = sqlx::query_as::<_, MeetingRaw>(
                    r#"
                    SELECT m.* FROM meetings AS m
                    WHERE m.payment_id = $1
                    "#,
                )
                .bind(meeting.payment_id.as_str())
                .fetch_optional(&self.pool)
                .await?
                .map(Meeting::try_from)
                .transpose()?;

                return Ok(match existing {
                    Some(existing) => ConfirmOutcome::AlreadyConfirmed(existing),
                    // Confirmed earlier against a different payment
                    None => ConfirmOutcome::MeetingConflict,
                });
            }
            ReservationStatus::Expired | ReservationStatus::Cancelled => {
                tx.rollback().await?;
                return Ok(ConfirmOutcome::Expired);
            }
            ReservationStatus::Held if reservation.expires_at <= now => {
                // Logically expired even though the sweep has not run yet
                tx.rollback().await?;
                return Ok(ConfirmOutcome::Expired);
            }
            ReservationStatus::Held => {}
        }

        sqlx::query(
            r#"
            UPDATE reservations
            SET status = 'confirmed'
            WHERE reservation_uid = $1
            "#,
        )
        .bind(reservation_id.as_ref())
        .execute(&mut *tx)
        .await?;

        if let Err(e) = insert_meeting(&mut *tx, meeting).await {
            let unique_violation = e
                .as_database_error()
                .and_then(|db| db.code())
                .is_some_and(|code| code == UNIQUE_VIOLATION);
            tx.rollback().await?;
            if unique_violation {
                warn!(
                    reservation_id = %reservation_id,
                    expert_id = %meeting.expert_id,
                    "Meeting slot already taken at confirmation time"
                );
                return Ok(ConfirmOutcome::MeetingConflict);
            }
            return Err(e.into());
        }

        tx.commit().await?;
        Ok(ConfirmOutcome::Confirmed(meeting.clone()))
    }

    #[instrument(name = "reservation::abort", skip(self))]
    async fn abort(&self, reservation_id: &ReservationId) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET status = 'cancelled'
            WHERE reservation_uid = $1 AND status = 'held'
            "#,
        )
        .bind(reservation_id.as_ref())
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                reservation_id = %reservation_id,
                error = ?e,
                "Failed to abort reservation"
            );
        })?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(name = "reservation::sweep_expired", skip(self))]
    async fn sweep_expired(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<Reservation>> {
        // Conditional update: a concurrent confirm that commits first takes
        // the row out of 'held' and out of this predicate.
        sqlx::query_as::<_, ReservationRaw>(
            r#"
            UPDATE reservations
            SET status = 'expired'
            WHERE status = 'held' AND expires_at <= $1
            RETURNING *
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| {
            error!(error = ?e, "Failed to sweep expired reservations");
        })?
        .into_iter()
        .map(Reservation::try_from)
        .collect()
    }

    #[instrument(name = "reservation::find", skip(self))]
    async fn find(&self, reservation_id: &ReservationId) -> anyhow::Result<Option<Reservation>> {
        sqlx::query_as::<_, ReservationRaw>(
            r#"
            SELECT r.* FROM reservations AS r
            WHERE r.reservation_uid = $1
            "#,
        )
        .bind(reservation_id.as_ref())
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                reservation_id = %reservation_id,
                error = ?e,
                "Failed to find reservation"
            );
        })?
        .map(Reservation::try_from)
        .transpose()
    }

    #[instrument(name = "reservation::find_by_payment_session", skip(self, session_id))]
    async fn find_by_payment_session(
        &self,
        session_id: &PaymentSessionId,
    ) -> anyhow::Result<Option<Reservation>> {
        sqlx::query_as::<_, ReservationRaw>(
            r#"
            SELECT r.* FROM reservations AS r
            WHERE r.payment_session_id = $1
            "#,
        )
        .bind(session_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| {
            error!(error = ?e, "Failed to find reservation by payment session");
        })?
        .map(Reservation::try_from)
        .transpose()
    }

    #[instrument(name = "reservation::mark_pending_voucher", skip(self))]
    async fn mark_pending_voucher(
        &self,
        reservation_id: &ReservationId,
        extended_expires_at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET pending_voucher = true,
                expires_at = GREATEST(expires_at, $2)
            WHERE reservation_uid = $1 AND status = 'held'
            "#,
        )
        .bind(reservation_id.as_ref())
        .bind(extended_expires_at)
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                reservation_id = %reservation_id,
                error = ?e,
                "Failed to mark reservation pending voucher"
            );
        })?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(name = "reservation::busy_intervals", skip(self, range))]
    async fn busy_intervals(
        &self,
        expert_id: &ExpertId,
        range: &TimeSpan,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Interval>> {
        let rows = sqlx::query_as::<_, IntervalRaw>(
            r#"
            SELECT r.start_time, r.end_time FROM reservations AS r
            WHERE r.expert_uid = $1 AND r.status = 'held' AND r.expires_at > $2
              AND r.start_time < $4 AND r.end_time > $3
            "#,
        )
        .bind(expert_id.as_ref())
        .bind(now)
        .bind(range.start())
        .bind(range.end())
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                expert_id = %expert_id,
                error = ?e,
                "Failed to load reservation busy intervals"
            );
        })?;

        Ok(rows
            .into_iter()
            .filter_map(|r| Interval::new(r.start_time, r.end_time))
            .collect())
    }
}
