//! Derived payment status view.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Badge severity. The presentation layer maps it to colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Green,
    Blue,
    Yellow,
    Orange,
    Purple,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayStatus {
    #[serde(rename = "Cancelled")]
    Cancelled,
    #[serde(rename = "Refund Due")]
    RefundDue,
    #[serde(rename = "Overpaid")]
    Overpaid,
    #[serde(rename = "Returned")]
    Returned,
    #[serde(rename = "Settled")]
    Settled,
    #[serde(rename = "Paid")]
    Paid,
    #[serde(rename = "Partially Paid")]
    PartiallyPaid,
    #[serde(rename = "Unpaid")]
    Unpaid,
}

impl DisplayStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DisplayStatus::Cancelled => "Cancelled",
            DisplayStatus::RefundDue => "Refund Due",
            DisplayStatus::Overpaid => "Overpaid",
            DisplayStatus::Returned => "Returned",
            DisplayStatus::Settled => "Settled",
            DisplayStatus::Paid => "Paid",
            DisplayStatus::PartiallyPaid => "Partially Paid",
            DisplayStatus::Unpaid => "Unpaid",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            DisplayStatus::Cancelled => Severity::Red,
            DisplayStatus::RefundDue | DisplayStatus::Overpaid => Severity::Purple,
            DisplayStatus::Returned => Severity::Orange,
            DisplayStatus::Settled | DisplayStatus::Paid => Severity::Green,
            DisplayStatus::PartiallyPaid => Severity::Blue,
            DisplayStatus::Unpaid => Severity::Yellow,
        }
    }
}

impl std::fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Settlement state of one purchase. Recomputed on every read, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletePaymentStatus {
    pub amount_paid: Decimal,
    pub net_owed: Decimal,
    pub remaining_amount: Decimal,
    pub overpaid_amount: Decimal,
    pub return_amount: Decimal,
    /// Overpayment reclassified as money owed back because of returns.
    pub refund_amount: Decimal,
    pub refund_due: Decimal,
    pub refunded_amount: Decimal,
    pub has_returns: bool,
    pub balance_resolved: bool,
    pub show_refund_section: bool,
    pub progress_percentage: u8,
    pub display_status: DisplayStatus,
    pub display_badge_color: Severity,
}
