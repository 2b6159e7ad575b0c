//! Payment status derivation for a purchase.
//!
//! Turns a purchase total, the active paid amount and the recorded returns
//! into one settlement state. All arithmetic is on `Decimal`, so an exact
//! payment is never misread as partial.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{
    has_balance_resolved, CompletePaymentStatus, DisplayStatus, Purchase, PurchaseReturn,
    PurchaseSnapshot, PurchaseStatus, RefundStatus, TimelineEvent,
};
use crate::services::SettlementError;

#[derive(Debug, Clone, Copy)]
pub struct PaymentStatusCalculator;

impl PaymentStatusCalculator {
    /// Derive the status from already-summed inputs.
    ///
    /// `amount_paid` must be the sum of active payments. Refunds already
    /// paid out are inferred from returns whose refund is `completed`.
    pub fn compute(
        purchase: &Purchase,
        amount_paid: Decimal,
        returns: &[PurchaseReturn],
        timeline: &[TimelineEvent],
    ) -> Result<CompletePaymentStatus, SettlementError> {
        Self::derive(purchase, amount_paid, returns, timeline, None)
    }

    /// Derive the status from a full snapshot, using recorded refund
    /// transactions for the refunded amount when there are any.
    pub fn compute_for_snapshot(
        snapshot: &PurchaseSnapshot,
    ) -> Result<CompletePaymentStatus, SettlementError> {
        if let Some(p) = snapshot
            .active_payments()
            .find(|p| p.amount < Decimal::ZERO)
        {
            return Err(SettlementError::InvalidInput(format!(
                "payment {} has negative amount {}",
                p.payment_id, p.amount
            )));
        }

        let refunded = if snapshot.refunds.is_empty() {
            None
        } else {
            Some(snapshot.refunded_total())
        };

        Self::derive(
            &snapshot.purchase,
            snapshot.amount_paid(),
            &snapshot.returns,
            &snapshot.timeline,
            refunded,
        )
    }

    fn derive(
        purchase: &Purchase,
        amount_paid: Decimal,
        returns: &[PurchaseReturn],
        timeline: &[TimelineEvent],
        recorded_refunds: Option<Decimal>,
    ) -> Result<CompletePaymentStatus, SettlementError> {
        validate_inputs(purchase, amount_paid, returns)?;

        let counted: Vec<&PurchaseReturn> =
            returns.iter().filter(|r| r.counts_toward_balance()).collect();
        let has_returns = !counted.is_empty();
        let return_amount: Decimal = counted.iter().map(|r| r.total_amount).sum();

        let net_owed = (purchase.total_amount - return_amount).max(Decimal::ZERO);
        let remaining_amount = (net_owed - amount_paid).max(Decimal::ZERO);
        let overpaid_amount = (amount_paid - net_owed).max(Decimal::ZERO);

        // With returns on file the whole overpayment is treated as owed back.
        let refund_amount = if overpaid_amount > Decimal::ZERO && return_amount > Decimal::ZERO {
            overpaid_amount
        } else {
            Decimal::ZERO
        };

        // Never report more refunded than is owed back, whatever the source.
        let refunded_amount = match recorded_refunds {
            Some(total) => total,
            None => counted
                .iter()
                .filter(|r| r.refund_status == RefundStatus::Completed)
                .map(|r| r.total_amount)
                .sum::<Decimal>(),
        }
        .min(refund_amount);
        let refund_due = (refund_amount - refunded_amount).max(Decimal::ZERO);

        let balance_resolved = has_balance_resolved(timeline);
        let progress_percentage =
            progress_percentage(purchase.total_amount, net_owed, amount_paid);

        let display_status = if purchase.status == PurchaseStatus::Cancelled {
            DisplayStatus::Cancelled
        } else if refund_due > Decimal::ZERO {
            DisplayStatus::RefundDue
        } else if overpaid_amount > Decimal::ZERO && !has_returns {
            DisplayStatus::Overpaid
        } else if net_owed.is_zero() && has_returns {
            DisplayStatus::Returned
        } else if purchase.total_amount.is_zero() {
            DisplayStatus::Paid
        } else if remaining_amount.is_zero() && has_returns && balance_resolved {
            DisplayStatus::Settled
        } else if remaining_amount.is_zero() {
            DisplayStatus::Paid
        } else if amount_paid > Decimal::ZERO {
            DisplayStatus::PartiallyPaid
        } else {
            DisplayStatus::Unpaid
        };

        Ok(CompletePaymentStatus {
            amount_paid,
            net_owed,
            remaining_amount,
            overpaid_amount,
            return_amount,
            refund_amount,
            refund_due,
            refunded_amount,
            has_returns,
            balance_resolved,
            show_refund_section: return_amount > Decimal::ZERO
                && (refund_due > Decimal::ZERO || refunded_amount > Decimal::ZERO),
            progress_percentage,
            display_status,
            display_badge_color: display_status.severity(),
        })
    }
}

fn validate_inputs(
    purchase: &Purchase,
    amount_paid: Decimal,
    returns: &[PurchaseReturn],
) -> Result<(), SettlementError> {
    if purchase.total_amount < Decimal::ZERO {
        return Err(SettlementError::InvalidInput(format!(
            "purchase total must not be negative (got {})",
            purchase.total_amount
        )));
    }
    if amount_paid < Decimal::ZERO {
        return Err(SettlementError::InvalidInput(format!(
            "amount paid must not be negative (got {})",
            amount_paid
        )));
    }
    if let Some(r) = returns.iter().find(|r| r.total_amount < Decimal::ZERO) {
        return Err(SettlementError::InvalidInput(format!(
            "return {} has negative amount {}",
            r.return_id, r.total_amount
        )));
    }
    Ok(())
}

/// Share of the net owed amount already paid, in whole percent.
fn progress_percentage(total_amount: Decimal, net_owed: Decimal, amount_paid: Decimal) -> u8 {
    if total_amount.is_zero() {
        return 100;
    }
    if net_owed > Decimal::ZERO {
        let ratio = (amount_paid / net_owed).min(Decimal::ONE);
        (ratio * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u8()
            .unwrap_or(100)
    } else if amount_paid > Decimal::ZERO {
        100
    } else {
        0
    }
}
