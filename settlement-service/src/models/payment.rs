//! Payment model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payment status. Void payments are kept for audit but never counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Active,
    Void,
}

/// How a payment was made, and by default how it is refunded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Check,
    CreditCard,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Check => "check",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::Other => "other",
        }
    }

    /// Method the operator falls back to when a refund through this method
    /// fails. Only bank transfers have one: they are re-issued as a check.
    pub fn refund_fallback(&self) -> Option<PaymentMethod> {
        match self {
            PaymentMethod::BankTransfer => Some(PaymentMethod::Check),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment recorded against a purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: Uuid,
    pub amount: Decimal,
    pub payment_date: DateTime<Utc>,
    pub status: PaymentStatus,
    pub payment_method: PaymentMethod,
    /// Row creation time; orders payments that share a `payment_date`.
    #[serde(default)]
    pub created_utc: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn is_active(&self) -> bool {
        self.status == PaymentStatus::Active
    }

    /// Oldest-first ordering key used for refund allocation.
    pub fn fifo_key(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            self.payment_date,
            self.created_utc.unwrap_or(self.payment_date),
        )
    }
}
