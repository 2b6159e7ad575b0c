//! Automatic refund workflow for a single return.
//!
//! A run first claims the return by moving it to `processing` with a
//! compare-and-set, then re-reads the purchase from the store before
//! deciding, so a refund is never allocated twice or against stale payments
//! or refunds.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::models::{PurchaseReturn, RefundAllocation, RefundStatus};
use crate::services::metrics::{record_allocation, REFUND_OUTCOMES_TOTAL};
use crate::services::status_service::StatusCache;
use crate::services::store::SettlementStore;
use crate::services::{RefundAllocator, SettlementError, StoreError};

/// Result of one refund run.
#[derive(Debug, Clone, Serialize)]
pub struct RefundOutcome {
    pub return_id: Uuid,
    pub purchase_id: Uuid,
    pub refund_status: RefundStatus,
    pub allocation: RefundAllocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl RefundOutcome {
    pub fn is_completed(&self) -> bool {
        self.refund_status == RefundStatus::Completed
    }
}

pub struct RefundProcessor {
    store: Arc<dyn SettlementStore>,
    cache: Option<StatusCache>,
    allow_partial: bool,
}

impl RefundProcessor {
    pub fn new(store: Arc<dyn SettlementStore>) -> Self {
        Self {
            store,
            cache: None,
            allow_partial: false,
        }
    }

    /// Invalidate `cache` for the purchase after every run.
    pub fn with_cache(mut self, cache: StatusCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Accept allocations that cover only part of the return.
    pub fn allow_partial(mut self, allow: bool) -> Self {
        self.allow_partial = allow;
        self
    }

    /// Refund a pending, auto-refund-eligible return.
    #[instrument(skip(self))]
    pub async fn process(&self, return_id: Uuid) -> Result<RefundOutcome, SettlementError> {
        self.run(return_id, PurchaseReturn::begin_refund).await
    }

    /// Re-run a refund that previously failed.
    #[instrument(skip(self))]
    pub async fn retry(&self, return_id: Uuid) -> Result<RefundOutcome, SettlementError> {
        self.run(return_id, PurchaseReturn::retry_refund).await
    }

    async fn run(
        &self,
        return_id: Uuid,
        enter: fn(&mut PurchaseReturn) -> Result<(), SettlementError>,
    ) -> Result<RefundOutcome, SettlementError> {
        let current = self
            .store
            .find_return(return_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => SettlementError::ReturnNotFound(return_id),
                other => other.into(),
            })?;
        let purchase_id = current.purchase_id;

        let mut claimed = current.clone();
        enter(&mut claimed)?;
        self.store
            .transition_return(current.refund_status, &claimed)
            .await?;

        let result = match self.settle(claimed.clone()).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.release(claimed, &e).await;
                Err(e)
            }
        };
        if let Some(cache) = &self.cache {
            cache.invalidate(&purchase_id);
        }

        let outcome = result?;
        REFUND_OUTCOMES_TOTAL
            .with_label_values(&[outcome.refund_status.as_str()])
            .inc();
        Ok(outcome)
    }

    // Runs with the return claimed in `processing`.
    async fn settle(
        &self,
        mut purchase_return: PurchaseReturn,
    ) -> Result<RefundOutcome, SettlementError> {
        let return_id = purchase_return.return_id;
        let snapshot = self.store.fetch_snapshot(purchase_return.purchase_id).await?;

        let recorded = snapshot.refunds_for(return_id);
        let (allocation, failure) = if recorded.is_empty() {
            let allocation = RefundAllocator::allocate_after(
                purchase_return.total_amount,
                &snapshot.payments,
                &snapshot.refunds,
            );
            record_allocation(&allocation);

            let failure = if !allocation.success {
                Some(allocation.issue_summary())
            } else if allocation.is_partial() && !self.allow_partial {
                Some(format!(
                    "partial refund not allowed: {}",
                    allocation.issue_summary()
                ))
            } else {
                match self
                    .store
                    .record_refunds(return_id, &allocation.refunds)
                    .await
                {
                    Ok(()) => None,
                    Err(e) => Some(e.to_string()),
                }
            };
            (allocation, failure)
        } else {
            // An earlier run paid out but never marked the return completed.
            info!(
                return_id = %return_id,
                transactions = recorded.len(),
                "Refunds already recorded, completing without a new payout"
            );
            (
                RefundAllocation::recorded(purchase_return.total_amount, recorded),
                None,
            )
        };

        match &failure {
            Some(reason) => {
                warn!(
                    return_id = %return_id,
                    reason = %reason,
                    "Refund failed"
                );
                purchase_return.fail_refund(reason.clone())?;
            }
            None => {
                info!(
                    return_id = %return_id,
                    purchase_status = %snapshot.purchase.status,
                    refunded = %allocation.total_refunded(),
                    transactions = allocation.refunds.len(),
                    "Refund completed"
                );
                purchase_return.complete_refund()?;
            }
        }
        self.store
            .transition_return(RefundStatus::Processing, &purchase_return)
            .await?;

        Ok(RefundOutcome {
            return_id,
            purchase_id: purchase_return.purchase_id,
            refund_status: purchase_return.refund_status,
            allocation,
            failure_reason: failure,
        })
    }

    /// Move a claimed return to `failed` after an error so it can be
    /// retried. The caller still gets the original error.
    async fn release(&self, mut purchase_return: PurchaseReturn, cause: &SettlementError) {
        let return_id = purchase_return.return_id;
        if let Err(e) = purchase_return.fail_refund(format!("refund interrupted: {}", cause)) {
            error!(return_id = %return_id, error = %e, "Cannot fail interrupted refund");
            return;
        }
        match self
            .store
            .transition_return(RefundStatus::Processing, &purchase_return)
            .await
        {
            Ok(()) => warn!(
                return_id = %return_id,
                error = %cause,
                "Refund interrupted, return marked failed"
            ),
            Err(e) => error!(
                return_id = %return_id,
                error = %e,
                cause = %cause,
                "Refund interrupted and return left in processing"
            ),
        }
    }
}
