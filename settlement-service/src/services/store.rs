//! Persistence seam for purchase settlement records.
//!
//! The authoritative records live in an external database. Everything the
//! workflows need from it goes through [`SettlementStore`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    PurchaseReturn, PurchaseSnapshot, RefundStatus, RefundTransaction, TimelineEvent,
    TimelineEventType,
};
use crate::services::StoreError;

#[async_trait]
pub trait SettlementStore: Send + Sync {
    /// Read a purchase with its payments, returns, refunds and timeline.
    async fn fetch_snapshot(&self, purchase_id: Uuid) -> Result<PurchaseSnapshot, StoreError>;

    /// Look up a single return, e.g. to find its purchase.
    async fn find_return(&self, return_id: Uuid) -> Result<PurchaseReturn, StoreError>;

    /// Replace a return only while its refund status is still `expected`.
    /// Fails with [`StoreError::Conflict`] when another writer got there
    /// first.
    async fn transition_return(
        &self,
        expected: RefundStatus,
        next: &PurchaseReturn,
    ) -> Result<(), StoreError>;

    /// Record refund transactions issued for a return, stamped with its id.
    /// A return is paid out at most once: recording again for the same
    /// return fails with [`StoreError::Conflict`].
    async fn record_refunds(
        &self,
        return_id: Uuid,
        refunds: &[RefundTransaction],
    ) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// In-memory store for local runs and tests.
#[derive(Default)]
pub struct InMemorySettlementStore {
    purchases: RwLock<HashMap<Uuid, PurchaseSnapshot>>,
    reject_refund_writes: AtomicBool,
}

impl InMemorySettlementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshots(snapshots: impl IntoIterator<Item = PurchaseSnapshot>) -> Self {
        let purchases = snapshots
            .into_iter()
            .map(|s| (s.purchase_id(), s))
            .collect();
        Self {
            purchases: RwLock::new(purchases),
            reject_refund_writes: AtomicBool::new(false),
        }
    }

    pub async fn insert(&self, snapshot: PurchaseSnapshot) {
        self.purchases
            .write()
            .await
            .insert(snapshot.purchase_id(), snapshot);
    }

    /// Make subsequent `record_refunds` calls fail, simulating a rejected
    /// payout.
    pub fn set_reject_refund_writes(&self, reject: bool) {
        self.reject_refund_writes.store(reject, Ordering::SeqCst);
    }
}

#[async_trait]
impl SettlementStore for InMemorySettlementStore {
    async fn fetch_snapshot(&self, purchase_id: Uuid) -> Result<PurchaseSnapshot, StoreError> {
        self.purchases
            .read()
            .await
            .get(&purchase_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("purchase {}", purchase_id)))
    }

    async fn find_return(&self, return_id: Uuid) -> Result<PurchaseReturn, StoreError> {
        self.purchases
            .read()
            .await
            .values()
            .find_map(|s| s.find_return(return_id).cloned())
            .ok_or_else(|| StoreError::NotFound(format!("return {}", return_id)))
    }

    async fn transition_return(
        &self,
        expected: RefundStatus,
        next: &PurchaseReturn,
    ) -> Result<(), StoreError> {
        let mut purchases = self.purchases.write().await;
        let snapshot = purchases
            .get_mut(&next.purchase_id)
            .ok_or_else(|| StoreError::NotFound(format!("purchase {}", next.purchase_id)))?;
        let slot = snapshot
            .returns
            .iter_mut()
            .find(|r| r.return_id == next.return_id)
            .ok_or_else(|| StoreError::NotFound(format!("return {}", next.return_id)))?;
        if slot.refund_status != expected {
            return Err(StoreError::Conflict(format!(
                "return {} is {}, expected {}",
                next.return_id, slot.refund_status, expected
            )));
        }
        *slot = next.clone();
        Ok(())
    }

    async fn record_refunds(
        &self,
        return_id: Uuid,
        refunds: &[RefundTransaction],
    ) -> Result<(), StoreError> {
        if self.reject_refund_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected(
                "refund transactions were not accepted".to_string(),
            ));
        }

        let mut purchases = self.purchases.write().await;
        let snapshot = purchases
            .values_mut()
            .find(|s| s.find_return(return_id).is_some())
            .ok_or_else(|| StoreError::NotFound(format!("return {}", return_id)))?;

        if snapshot
            .refunds
            .iter()
            .any(|r| r.return_id == Some(return_id))
        {
            return Err(StoreError::Conflict(format!(
                "refunds already recorded for return {}",
                return_id
            )));
        }

        snapshot
            .refunds
            .extend(refunds.iter().cloned().map(|mut refund| {
                refund.return_id = Some(return_id);
                refund
            }));
        snapshot.timeline.push(
            TimelineEvent::new(TimelineEventType::RefundCompleted, Utc::now())
                .with_note(format!("return {}", return_id)),
        );
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
