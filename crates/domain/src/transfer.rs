use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::entity::{MeetingId, PayoutAccountId, ProviderTransferId, TransferId};

pub const MAX_DISBURSE_ATTEMPTS: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    /// Created on payment capture, waiting to age
    Pending,
    /// Manually approved: aging is bypassed, the schedule is not
    Approved,
    /// Disbursed with a provider transfer id
    Completed,
    /// Gave up after repeated provider errors
    Failed,
    /// Voided because the meeting was cancelled before disbursement
    Cancelled,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Legal transitions. Status moves monotonically: terminal states never
    /// transition again, and a transfer never returns to PENDING.
    pub fn can_transition_to(&self, next: TransferStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Completed)
                | (Self::Pending, Self::Failed)
                | (Self::Pending, Self::Cancelled)
                | (Self::Approved, Self::Completed)
                | (Self::Approved, Self::Failed)
                | (Self::Approved, Self::Cancelled)
        )
    }
}

#[derive(Error, Debug)]
#[error("Illegal transfer transition {from:?} -> {to:?}")]
pub struct IllegalTransferTransition {
    pub from: TransferStatus,
    pub to: TransferStatus,
}

/// A directed payout from the platform to the expert's payout account.
/// Never destroyed; failed and cancelled rows stay for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTransfer {
    pub id: TransferId,
    pub meeting_id: MeetingId,
    pub expert_account_id: PayoutAccountId,
    /// Captured amount in currency minor units
    pub gross_amount: i64,
    /// Platform cut, already floored at capture time
    pub platform_fee: i64,
    /// What the expert receives: gross minus fee
    pub net_amount: i64,
    pub currency: String,
    /// Disburse no earlier than this instant
    pub scheduled_at: DateTime<Utc>,
    /// When the underlying payment was captured; aging counts from here
    pub payment_created_at: DateTime<Utc>,
    pub status: TransferStatus,
    pub requires_approval: bool,
    pub retry_count: i32,
    pub last_error: Option<String>,
    pub provider_transfer_id: Option<ProviderTransferId>,
    pub created_at: DateTime<Utc>,
}

impl PaymentTransfer {
    pub fn transition(
        &mut self,
        next: TransferStatus,
    ) -> Result<(), IllegalTransferTransition> {
        if !self.status.can_transition_to(next) {
            return Err(IllegalTransferTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Whether this transfer may be disbursed right now.
    ///
    /// Both the scheduled instant and the per-country aging floor must have
    /// passed. A manually APPROVED transfer bypasses the aging floor but
    /// still waits for its scheduled instant.
    pub fn is_eligible(&self, now: DateTime<Utc>, payout_delay_days: i64) -> bool {
        match self.status {
            TransferStatus::Pending => {
                self.scheduled_at <= now
                    && (now - self.payment_created_at).num_days() >= payout_delay_days
            }
            TransferStatus::Approved => self.scheduled_at <= now,
            _ => false,
        }
    }

    /// Record a failed disbursement attempt. Returns the status after the
    /// bookkeeping: FAILED once the attempt budget is exhausted, otherwise
    /// the current status so the next sweep retries.
    pub fn record_failure(&mut self, error: impl Into<String>) -> TransferStatus {
        self.retry_count += 1;
        self.last_error = Some(error.into());
        if self.retry_count >= MAX_DISBURSE_ATTEMPTS {
            self.status = TransferStatus::Failed;
        }
        self.status
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn transfer(now: DateTime<Utc>) -> PaymentTransfer {
        PaymentTransfer {
            id: TransferId::new_v4(),
            meeting_id: MeetingId::new_v4(),
            expert_account_id: PayoutAccountId::new("acct_1"),
            gross_amount: 10000,
            platform_fee: 1500,
            net_amount: 8500,
            currency: "EUR".into(),
            scheduled_at: now,
            payment_created_at: now,
            status: TransferStatus::Pending,
            requires_approval: false,
            retry_count: 0,
            last_error: None,
            provider_transfer_id: None,
            created_at: now,
        }
    }

    #[test]
    fn transitions_are_monotonic() {
        assert!(TransferStatus::Pending.can_transition_to(TransferStatus::Approved));
        assert!(TransferStatus::Pending.can_transition_to(TransferStatus::Completed));
        assert!(TransferStatus::Approved.can_transition_to(TransferStatus::Completed));

        assert!(!TransferStatus::Approved.can_transition_to(TransferStatus::Pending));
        assert!(!TransferStatus::Completed.can_transition_to(TransferStatus::Failed));
        assert!(!TransferStatus::Failed.can_transition_to(TransferStatus::Pending));
        assert!(!TransferStatus::Cancelled.can_transition_to(TransferStatus::Completed));
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let mut t = transfer(now);
        t.transition(TransferStatus::Completed).unwrap();
        assert!(t.transition(TransferStatus::Failed).is_err());
        assert_eq!(t.status, TransferStatus::Completed);
    }

    #[test]
    fn aging_floor_holds_pending_transfers_back() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let t = transfer(now);

        // Day 6 of a 7 day delay: not eligible
        assert!(!t.is_eligible(now + Duration::days(6), 7));
        // Day 8: eligible
        assert!(t.is_eligible(now + Duration::days(8), 7));
    }

    #[test]
    fn approval_bypasses_aging_but_not_the_schedule() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let mut t = transfer(now);
        t.scheduled_at = now + Duration::days(2);
        t.transition(TransferStatus::Approved).unwrap();

        // Aging would demand 30 days, approval waives it
        assert!(t.is_eligible(now + Duration::days(2), 30));
        // But the scheduled instant still gates
        assert!(!t.is_eligible(now + Duration::days(1), 30));
    }

    #[test]
    fn terminal_transfers_are_never_eligible() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        for status in [
            TransferStatus::Completed,
            TransferStatus::Failed,
            TransferStatus::Cancelled,
        ] {
            let mut t = transfer(now);
            t.status = status;
            assert!(!t.is_eligible(now + Duration::days(365), 0));
        }
    }

    #[test]
    fn failures_accumulate_into_terminal_failed() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let mut t = transfer(now);

        assert_eq!(t.record_failure("timeout"), TransferStatus::Pending);
        assert_eq!(t.record_failure("timeout"), TransferStatus::Pending);
        assert_eq!(t.record_failure("timeout"), TransferStatus::Failed);
        assert_eq!(t.retry_count, 3);
        assert_eq!(t.last_error.as_deref(), Some("timeout"));
    }
}
