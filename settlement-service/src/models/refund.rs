//! Refund transactions and allocation results.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use super::{Payment, PaymentMethod};

/// One chunk of a refund, drawn from a single source payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundTransaction {
    /// Return this refund was issued for, once recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_id: Option<Uuid>,
    pub source_payment_id: Uuid,
    pub payment_date: DateTime<Utc>,
    pub refund_amount: Decimal,
    pub refund_method: PaymentMethod,
    /// Operator note: method to re-issue with if the primary one fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_method: Option<PaymentMethod>,
}

impl RefundTransaction {
    pub fn from_payment(payment: &Payment, refund_amount: Decimal) -> Self {
        Self {
            return_id: None,
            source_payment_id: payment.payment_id,
            payment_date: payment.payment_date,
            refund_amount,
            refund_method: payment.payment_method,
            fallback_method: payment.payment_method.refund_fallback(),
        }
    }
}

/// Problems found while allocating a refund. Returned as data, never thrown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationIssue {
    InvalidAmount { reason: String },
    NoPaymentsAvailable,
    InsufficientFunds {
        requested: Decimal,
        unallocated: Decimal,
    },
}

impl AllocationIssue {
    pub fn code(&self) -> &'static str {
        match self {
            AllocationIssue::InvalidAmount { .. } => "invalid_amount",
            AllocationIssue::NoPaymentsAvailable => "no_payments_available",
            AllocationIssue::InsufficientFunds { .. } => "insufficient_funds",
        }
    }
}

impl std::fmt::Display for AllocationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationIssue::InvalidAmount { reason } => write!(f, "{}", reason),
            AllocationIssue::NoPaymentsAvailable => write!(f, "no payments available to refund"),
            AllocationIssue::InsufficientFunds {
                requested,
                unallocated,
            } => write!(
                f,
                "refund of {} exceeds refundable payments; {} could not be allocated",
                requested, unallocated
            ),
        }
    }
}

impl Serialize for AllocationIssue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AllocationIssue", 2)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Outcome of a FIFO refund allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundAllocation {
    pub success: bool,
    pub refunds: Vec<RefundTransaction>,
    pub errors: Vec<AllocationIssue>,
    /// Portion of the requested refund no payment could cover.
    pub unallocated: Decimal,
}

impl RefundAllocation {
    pub fn rejected(requested: Decimal, issue: AllocationIssue) -> Self {
        Self {
            success: false,
            refunds: Vec::new(),
            errors: vec![issue],
            unallocated: requested.max(Decimal::ZERO),
        }
    }

    /// Allocation rebuilt from refunds already recorded for a return.
    pub fn recorded(requested: Decimal, refunds: Vec<RefundTransaction>) -> Self {
        let refunded: Decimal = refunds.iter().map(|r| r.refund_amount).sum();
        Self {
            success: true,
            refunds,
            errors: Vec::new(),
            unallocated: (requested - refunded).max(Decimal::ZERO),
        }
    }

    pub fn total_refunded(&self) -> Decimal {
        self.refunds.iter().map(|r| r.refund_amount).sum()
    }

    /// True when some money was allocated but not all of it.
    pub fn is_partial(&self) -> bool {
        self.success && self.unallocated > Decimal::ZERO
    }

    /// All issue messages joined for storage as a failure reason.
    pub fn issue_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}
