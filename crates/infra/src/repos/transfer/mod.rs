mod postgres;

use chrono::{DateTime, Utc};
pub use postgres::PostgresTransferRepo;
use soudan_domain::{MeetingId, PaymentTransfer, ProviderTransferId, TransferId, TransferStatus};

#[async_trait::async_trait]
pub trait ITransferRepo: Send + Sync {
    async fn insert(&self, transfer: &PaymentTransfer) -> anyhow::Result<()>;

    async fn find(&self, transfer_id: &TransferId) -> anyhow::Result<Option<PaymentTransfer>>;

    async fn find_by_meeting(
        &self,
        meeting_id: &MeetingId,
    ) -> anyhow::Result<Vec<PaymentTransfer>>;

    /// Transfers whose scheduled instant has passed and that have not been
    /// handed to the provider yet. Candidates only; each one must still be
    /// claimed before disbursing.
    async fn find_due(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> anyhow::Result<Vec<PaymentTransfer>>;

    /// Claim a due transfer for this worker with a conditional update.
    /// Returns the claimed row, or None when another worker holds it, the
    /// transfer left PENDING/APPROVED, or the provider already has it.
    async fn claim(
        &self,
        transfer_id: &TransferId,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<PaymentTransfer>>;

    /// PENDING/APPROVED -> COMPLETED with the provider-assigned id.
    /// Returns false when the transfer already left the claimable states.
    async fn complete(
        &self,
        transfer_id: &TransferId,
        provider_transfer_id: &ProviderTransferId,
    ) -> anyhow::Result<bool>;

    /// Record a failed attempt; flips to FAILED once the attempt budget is
    /// spent. Returns the status after bookkeeping.
    async fn record_failure(
        &self,
        transfer_id: &TransferId,
        error: &str,
    ) -> anyhow::Result<Option<TransferStatus>>;

    /// PENDING -> APPROVED (manual approval bypasses the aging floor).
    async fn approve(&self, transfer_id: &TransferId) -> anyhow::Result<bool>;

    /// Void the transfer of a cancelled meeting when not yet disbursed.
    async fn void_for_meeting(&self, meeting_id: &MeetingId) -> anyhow::Result<u64>;
}
