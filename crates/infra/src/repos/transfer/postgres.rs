use std::convert::TryFrom;

use chrono::{DateTime, Duration, Utc};
use soudan_domain::{
    MeetingId,
    PaymentTransfer,
    PayoutAccountId,
    ProviderTransferId,
    TransferId,
    TransferStatus,
    MAX_DISBURSE_ATTEMPTS,
};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::{error, instrument};

use super::ITransferRepo;

/// A claim goes stale after this long, so a worker that died mid-attempt
/// does not park the transfer forever.
const CLAIM_WINDOW_MINUTES: i64 = 5;

pub struct PostgresTransferRepo {
    pool: PgPool,
}

impl PostgresTransferRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TransferRaw {
    transfer_uid: Uuid,
    meeting_uid: Uuid,
    expert_account_id: String,
    gross_amount: i64,
    platform_fee: i64,
    net_amount: i64,
    currency: String,
    scheduled_at: DateTime<Utc>,
    payment_created_at: DateTime<Utc>,
    status: String,
    requires_approval: bool,
    retry_count: i32,
    last_error: Option<String>,
    provider_transfer_id: Option<String>,
    #[allow(dead_code)]
    last_attempt_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransferRaw> for PaymentTransfer {
    type Error = anyhow::Error;

    fn try_from(t: TransferRaw) -> anyhow::Result<Self> {
        let status = TransferStatus::from_db(&t.status)
            .ok_or_else(|| anyhow::anyhow!("Unknown transfer status in database: {}", t.status))?;
        Ok(Self {
            id: t.transfer_uid.into(),
            meeting_id: t.meeting_uid.into(),
            expert_account_id: PayoutAccountId::new(t.expert_account_id),
            gross_amount: t.gross_amount,
            platform_fee: t.platform_fee,
            net_amount: t.net_amount,
            currency: t.currency,
            scheduled_at: t.scheduled_at,
            payment_created_at: t.payment_created_at,
            status,
            requires_approval: t.requires_approval,
            retry_count: t.retry_count,
            last_error: t.last_error,
            provider_transfer_id: t.provider_transfer_id.map(ProviderTransferId::new),
            created_at: t.created_at,
        })
    }
}

#[async_trait::async_trait]
impl ITransferRepo for PostgresTransferRepo {
    #[instrument(name = "transfer::insert", skip(self, transfer), fields(transfer_id = %transfer.id))]
    async fn insert(&self, transfer: &PaymentTransfer) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO transfers(
                transfer_uid, meeting_uid, expert_account_id,
                gross_amount, platform_fee, net_amount, currency,
                scheduled_at, payment_created_at, status, requires_approval,
                retry_count, last_error, provider_transfer_id, created_at
            )
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(transfer.id.as_ref())
        .bind(transfer.meeting_id.as_ref())
        .bind(transfer.expert_account_id.as_str())
        .bind(transfer.gross_amount)
        .bind(transfer.platform_fee)
        .bind(transfer.net_amount)
        .bind(&transfer.currency)
        .bind(transfer.scheduled_at)
        .bind(transfer.payment_created_at)
        .bind(transfer.status.as_str())
        .bind(transfer.requires_approval)
        .bind(transfer.retry_count)
        .bind(transfer.last_error.as_ref())
        .bind(transfer.provider_transfer_id.as_ref().map(|p| p.as_str()))
        .bind(transfer.created_at)
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                transfer_id = %transfer.id,
                meeting_id = %transfer.meeting_id,
                error = ?e,
                "Failed to insert transfer"
            );
        })?;
        Ok(())
    }

    #[instrument(name = "transfer::find", skip(self))]
    async fn find(&self, transfer_id: &TransferId) -> anyhow::Result<Option<PaymentTransfer>> {
        sqlx::query_as::<_, TransferRaw>(
            r#"
            SELECT t.* FROM transfers AS t
            WHERE t.transfer_uid = $1
            "#,
        )
        .bind(transfer_id.as_ref())
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                transfer_id = %transfer_id,
                error = ?e,
                "Failed to find transfer"
            );
        })?
        .map(PaymentTransfer::try_from)
        .transpose()
    }

    #[instrument(name = "transfer::find_by_meeting", skip(self))]
    async fn find_by_meeting(
        &self,
        meeting_id: &MeetingId,
    ) -> anyhow::Result<Vec<PaymentTransfer>> {
        sqlx::query_as::<_, TransferRaw>(
            r#"
            SELECT t.* FROM transfers AS t
            WHERE t.meeting_uid = $1
            ORDER BY t.created_at
            "#,
        )
        .bind(meeting_id.as_ref())
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                meeting_id = %meeting_id,
                error = ?e,
                "Failed to find transfers for meeting"
            );
        })?
        .into_iter()
        .map(PaymentTransfer::try_from)
        .collect()
    }

    #[instrument(name = "transfer::find_due", skip(self))]
    async fn find_due(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> anyhow::Result<Vec<PaymentTransfer>> {
        sqlx::query_as::<_, TransferRaw>(
            r#"
            SELECT t.* FROM transfers AS t
            WHERE t.status IN ('pending', 'approved')
              AND t.provider_transfer_id IS NULL
              AND t.scheduled_at <= $1
            ORDER BY t.scheduled_at
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| {
            error!(error = ?e, "Failed to find due transfers");
        })?
        .into_iter()
        .map(PaymentTransfer::try_from)
        .collect()
    }

    #[instrument(name = "transfer::claim", skip(self))]
    async fn claim(
        &self,
        transfer_id: &TransferId,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<PaymentTransfer>> {
        let stale_before = now - Duration::minutes(CLAIM_WINDOW_MINUTES);
        sqlx::query_as::<_, TransferRaw>(
            r#"
            UPDATE transfers
            SET last_attempt_at = $2
            WHERE transfer_uid = $1
              AND status IN ('pending', 'approved')
              AND provider_transfer_id IS NULL
              AND (last_attempt_at IS NULL OR last_attempt_at <= $3)
            RETURNING *
            "#,
        )
        .bind(transfer_id.as_ref())
        .bind(now)
        .bind(stale_before)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                transfer_id = %transfer_id,
                error = ?e,
                "Failed to claim transfer"
            );
        })?
        .map(PaymentTransfer::try_from)
        .transpose()
    }

    #[instrument(name = "transfer::complete", skip(self, provider_transfer_id))]
    async fn complete(
        &self,
        transfer_id: &TransferId,
        provider_transfer_id: &ProviderTransferId,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE transfers
            SET status = 'completed',
                provider_transfer_id = $2
            WHERE transfer_uid = $1 AND status IN ('pending', 'approved')
            "#,
        )
        .bind(transfer_id.as_ref())
        .bind(provider_transfer_id.as_str())
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                transfer_id = %transfer_id,
                error = ?e,
                "Failed to complete transfer"
            );
        })?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(name = "transfer::record_failure", skip(self, error_message))]
    async fn record_failure(
        &self,
        transfer_id: &TransferId,
        error_message: &str,
    ) -> anyhow::Result<Option<TransferStatus>> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            UPDATE transfers
            SET retry_count = retry_count + 1,
                last_error = $2,
                status = CASE
                    WHEN retry_count + 1 >= $3 THEN 'failed'
                    ELSE status
                END
            WHERE transfer_uid = $1 AND status IN ('pending', 'approved')
            RETURNING status
            "#,
        )
        .bind(transfer_id.as_ref())
        .bind(error_message)
        .bind(MAX_DISBURSE_ATTEMPTS)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                transfer_id = %transfer_id,
                error = ?e,
                "Failed to record transfer failure"
            );
        })?;

        Ok(row.and_then(|(status,)| TransferStatus::from_db(&status)))
    }

    #[instrument(name = "transfer::approve", skip(self))]
    async fn approve(&self, transfer_id: &TransferId) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE transfers
            SET status = 'approved'
            WHERE transfer_uid = $1 AND status = 'pending'
            "#,
        )
        .bind(transfer_id.as_ref())
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                transfer_id = %transfer_id,
                error = ?e,
                "Failed to approve transfer"
            );
        })?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(name = "transfer::void_for_meeting", skip(self))]
    async fn void_for_meeting(&self, meeting_id: &MeetingId) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE transfers
            SET status = 'cancelled'
            WHERE meeting_uid = $1 AND status IN ('pending', 'approved')
            "#,
        )
        .bind(meeting_id.as_ref())
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                meeting_id = %meeting_id,
                error = ?e,
                "Failed to void transfers for meeting"
            );
        })?;
        Ok(result.rows_affected())
    }
}
