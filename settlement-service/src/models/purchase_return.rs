//! Purchase return model and its refund state machine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::SettlementError;

/// Lifecycle of the return itself (goods going back to the supplier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    Pending,
    Approved,
    Completed,
    Cancelled,
}

/// Refund progress for a return.
///
/// ```text
/// pending ──► processing ──► completed
///    │            │
///    │            └──► failed ──(explicit retry)──► processing
///    └──► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl RefundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::Pending => "pending",
            RefundStatus::Processing => "processing",
            RefundStatus::Completed => "completed",
            RefundStatus::Failed => "failed",
            RefundStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(&self, next: RefundStatus) -> bool {
        matches!(
            (self, next),
            (RefundStatus::Pending, RefundStatus::Processing)
                | (RefundStatus::Pending, RefundStatus::Cancelled)
                | (RefundStatus::Processing, RefundStatus::Completed)
                | (RefundStatus::Processing, RefundStatus::Failed)
                | (RefundStatus::Failed, RefundStatus::Processing)
        )
    }
}

impl std::fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Return recorded against a purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseReturn {
    pub return_id: Uuid,
    pub purchase_id: Uuid,
    /// Refundable amount for this return.
    pub total_amount: Decimal,
    pub return_date: DateTime<Utc>,
    #[serde(default = "default_return_status")]
    pub status: ReturnStatus,
    #[serde(default = "default_refund_status")]
    pub refund_status: RefundStatus,
    #[serde(default)]
    pub auto_refund_eligible: bool,
    #[serde(default)]
    pub refund_failure_reason: Option<String>,
}

fn default_return_status() -> ReturnStatus {
    ReturnStatus::Approved
}

fn default_refund_status() -> RefundStatus {
    RefundStatus::Pending
}

impl PurchaseReturn {
    /// Cancelled returns do not reduce what is owed.
    pub fn counts_toward_balance(&self) -> bool {
        self.status != ReturnStatus::Cancelled
    }

    /// Move a pending, auto-refund-eligible return into `processing`.
    pub fn begin_refund(&mut self) -> Result<(), SettlementError> {
        if self.refund_status != RefundStatus::Pending {
            return Err(SettlementError::InvalidTransition {
                from: self.refund_status,
                to: RefundStatus::Processing,
            });
        }
        if !self.auto_refund_eligible || !self.counts_toward_balance() {
            return Err(SettlementError::NotEligible(self.return_id));
        }
        self.transition(RefundStatus::Processing)
    }

    /// Re-enter `processing` after a failure. Never implicit: the previous
    /// failure reason is kept until the retry completes.
    pub fn retry_refund(&mut self) -> Result<(), SettlementError> {
        if self.refund_status != RefundStatus::Failed {
            return Err(SettlementError::InvalidTransition {
                from: self.refund_status,
                to: RefundStatus::Processing,
            });
        }
        self.transition(RefundStatus::Processing)
    }

    pub fn complete_refund(&mut self) -> Result<(), SettlementError> {
        self.transition(RefundStatus::Completed)?;
        self.refund_failure_reason = None;
        Ok(())
    }

    pub fn fail_refund(&mut self, reason: impl Into<String>) -> Result<(), SettlementError> {
        self.transition(RefundStatus::Failed)?;
        self.refund_failure_reason = Some(reason.into());
        Ok(())
    }

    pub fn cancel_refund(&mut self) -> Result<(), SettlementError> {
        self.transition(RefundStatus::Cancelled)
    }

    fn transition(&mut self, next: RefundStatus) -> Result<(), SettlementError> {
        if !self.refund_status.can_transition_to(next) {
            return Err(SettlementError::InvalidTransition {
                from: self.refund_status,
                to: next,
            });
        }
        self.refund_status = next;
        Ok(())
    }
}
