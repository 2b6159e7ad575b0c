//! Purchase model and the snapshot the calculators read from.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Payment, PurchaseReturn, RefundTransaction, TimelineEvent};

/// Receipt/return lifecycle of a purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Pending,
    PartiallyReceived,
    Received,
    PartiallyReturned,
    Returned,
    Cancelled,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::PartiallyReceived => "partially_received",
            PurchaseStatus::Received => "received",
            PurchaseStatus::PartiallyReturned => "partially_returned",
            PurchaseStatus::Returned => "returned",
            PurchaseStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Purchase order header. The total is fixed once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub purchase_id: Uuid,
    pub total_amount: Decimal,
    pub status: PurchaseStatus,
}

/// Everything needed to derive settlement state for one purchase, read
/// together from the external store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseSnapshot {
    pub purchase: Purchase,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub returns: Vec<PurchaseReturn>,
    /// Refund transactions already recorded against this purchase's payments.
    #[serde(default)]
    pub refunds: Vec<RefundTransaction>,
    #[serde(default)]
    pub timeline: Vec<TimelineEvent>,
}

impl PurchaseSnapshot {
    pub fn new(purchase: Purchase) -> Self {
        Self {
            purchase,
            payments: Vec::new(),
            returns: Vec::new(),
            refunds: Vec::new(),
            timeline: Vec::new(),
        }
    }

    pub fn purchase_id(&self) -> Uuid {
        self.purchase.purchase_id
    }

    pub fn active_payments(&self) -> impl Iterator<Item = &Payment> {
        self.payments.iter().filter(|p| p.is_active())
    }

    /// Sum of active payments. Void payments never count.
    pub fn amount_paid(&self) -> Decimal {
        self.active_payments().map(|p| p.amount).sum()
    }

    pub fn refunded_total(&self) -> Decimal {
        self.refunds.iter().map(|r| r.refund_amount).sum()
    }

    pub fn find_return(&self, return_id: Uuid) -> Option<&PurchaseReturn> {
        self.returns.iter().find(|r| r.return_id == return_id)
    }

    /// Refund transactions already recorded against `return_id`.
    pub fn refunds_for(&self, return_id: Uuid) -> Vec<RefundTransaction> {
        self.refunds
            .iter()
            .filter(|r| r.return_id == Some(return_id))
            .cloned()
            .collect()
    }
}
