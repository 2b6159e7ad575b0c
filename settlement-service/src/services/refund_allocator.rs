//! FIFO refund allocation.
//!
//! A refund is drawn from the purchase's active payments oldest first, one
//! refund transaction per payment touched. The order is decided here, not by
//! the caller, so the same inputs always give the same breakdown.

use std::collections::HashMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{AllocationIssue, Payment, RefundAllocation, RefundTransaction};

#[derive(Debug, Clone, Copy)]
pub struct RefundAllocator;

impl RefundAllocator {
    /// Allocate `return_amount` across `payments`.
    pub fn allocate(return_amount: Decimal, payments: &[Payment]) -> RefundAllocation {
        Self::allocate_after(return_amount, payments, &[])
    }

    /// Allocate `return_amount` across `payments`, skipping whatever
    /// `prior_refunds` already drew from each payment.
    pub fn allocate_after(
        return_amount: Decimal,
        payments: &[Payment],
        prior_refunds: &[RefundTransaction],
    ) -> RefundAllocation {
        if return_amount <= Decimal::ZERO {
            return RefundAllocation::rejected(
                return_amount,
                AllocationIssue::InvalidAmount {
                    reason: format!("refund amount must be positive (got {})", return_amount),
                },
            );
        }
        if let Some(p) = payments.iter().find(|p| p.amount < Decimal::ZERO) {
            return RefundAllocation::rejected(
                return_amount,
                AllocationIssue::InvalidAmount {
                    reason: format!("payment {} has negative amount {}", p.payment_id, p.amount),
                },
            );
        }

        let mut sources: Vec<&Payment> = payments.iter().filter(|p| p.is_active()).collect();
        if sources.is_empty() {
            return RefundAllocation::rejected(return_amount, AllocationIssue::NoPaymentsAvailable);
        }
        // Stable: payments with identical keys keep their input order.
        sources.sort_by_key(|p| p.fifo_key());

        let mut drawn: HashMap<Uuid, Decimal> = HashMap::new();
        for refund in prior_refunds {
            *drawn.entry(refund.source_payment_id).or_insert(Decimal::ZERO) += refund.refund_amount;
        }

        let mut remaining = return_amount;
        let mut refunds = Vec::new();

        for payment in sources {
            if remaining <= Decimal::ZERO {
                break;
            }
            let already = drawn.get(&payment.payment_id).copied().unwrap_or(Decimal::ZERO);
            let available = (payment.amount - already).max(Decimal::ZERO);
            if available.is_zero() {
                continue;
            }

            let chunk = available.min(remaining);
            tracing::debug!(
                payment_id = %payment.payment_id,
                method = %payment.payment_method,
                amount = %chunk,
                "Refund drawn from payment"
            );
            refunds.push(RefundTransaction::from_payment(payment, chunk));
            remaining -= chunk;
        }

        let mut errors = Vec::new();
        if remaining > Decimal::ZERO {
            tracing::warn!(
                requested = %return_amount,
                unallocated = %remaining,
                "Refund exceeds refundable payments"
            );
            errors.push(AllocationIssue::InsufficientFunds {
                requested: return_amount,
                unallocated: remaining,
            });
        }

        RefundAllocation {
            success: !refunds.is_empty(),
            refunds,
            errors,
            unallocated: remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentMethod, PaymentStatus};
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn payment(day: u32, amount: &str, method: PaymentMethod) -> Payment {
        Payment {
            payment_id: Uuid::new_v4(),
            amount: dec(amount),
            payment_date: Utc.with_ymd_and_hms(2024, 1, day, 10, 0, 0).unwrap(),
            status: PaymentStatus::Active,
            payment_method: method,
            created_utc: None,
        }
    }

    #[test]
    fn test_fifo_split_across_two_payments() {
        let payments = vec![
            payment(1, "200", PaymentMethod::Cash),
            payment(5, "500", PaymentMethod::BankTransfer),
        ];

        let result = RefundAllocator::allocate(dec("300"), &payments);

        assert!(result.success);
        assert!(result.errors.is_empty());
        assert_eq!(result.unallocated, Decimal::ZERO);
        assert_eq!(result.refunds.len(), 2);

        assert_eq!(result.refunds[0].refund_amount, dec("200"));
        assert_eq!(result.refunds[0].refund_method, PaymentMethod::Cash);
        assert_eq!(result.refunds[0].fallback_method, None);
        assert_eq!(result.refunds[0].source_payment_id, payments[0].payment_id);

        assert_eq!(result.refunds[1].refund_amount, dec("100"));
        assert_eq!(result.refunds[1].refund_method, PaymentMethod::BankTransfer);
        assert_eq!(result.refunds[1].fallback_method, Some(PaymentMethod::Check));
    }

    #[test]
    fn test_no_payments_is_a_structured_failure() {
        let result = RefundAllocator::allocate(dec("300"), &[]);

        assert!(!result.success);
        assert!(result.refunds.is_empty());
        assert_eq!(result.errors, vec![AllocationIssue::NoPaymentsAvailable]);
        assert_eq!(result.errors[0].to_string(), "no payments available to refund");
        assert_eq!(result.unallocated, dec("300"));
    }

    #[test]
    fn test_void_payments_are_never_a_source() {
        let mut void = payment(1, "1000", PaymentMethod::Cash);
        void.status = PaymentStatus::Void;

        let result = RefundAllocator::allocate(dec("50"), &[void.clone()]);
        assert!(!result.success);
        assert_eq!(result.errors, vec![AllocationIssue::NoPaymentsAvailable]);

        let active = payment(2, "80", PaymentMethod::Check);
        let result = RefundAllocator::allocate(dec("50"), &[void, active.clone()]);
        assert_eq!(result.refunds.len(), 1);
        assert_eq!(result.refunds[0].source_payment_id, active.payment_id);
    }

    #[test]
    fn test_insufficient_funds_returns_partial_allocation() {
        let payments = vec![
            payment(3, "100", PaymentMethod::Cash),
            payment(4, "50", PaymentMethod::CreditCard),
        ];

        let result = RefundAllocator::allocate(dec("400"), &payments);

        assert!(result.success);
        assert!(result.is_partial());
        assert_eq!(result.total_refunded(), dec("150"));
        assert_eq!(result.unallocated, dec("250"));
        assert_eq!(
            result.errors,
            vec![AllocationIssue::InsufficientFunds {
                requested: dec("400"),
                unallocated: dec("250"),
            }]
        );
    }

    #[test]
    fn test_invalid_amounts_rejected() {
        let payments = vec![payment(1, "100", PaymentMethod::Cash)];

        for amount in ["0", "-10"] {
            let result = RefundAllocator::allocate(dec(amount), &payments);
            assert!(!result.success);
            assert_eq!(result.errors[0].code(), "invalid_amount");
        }

        let bad = vec![payment(1, "-1", PaymentMethod::Cash)];
        let result = RefundAllocator::allocate(dec("10"), &bad);
        assert!(!result.success);
        assert_eq!(result.errors[0].code(), "invalid_amount");
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let oldest = payment(1, "100", PaymentMethod::Cash);
        let middle = payment(7, "100", PaymentMethod::Check);
        let newest = payment(20, "100", PaymentMethod::BankTransfer);

        let sorted = RefundAllocator::allocate(
            dec("150"),
            &[oldest.clone(), middle.clone(), newest.clone()],
        );
        let shuffled = RefundAllocator::allocate(dec("150"), &[newest, oldest.clone(), middle]);

        assert_eq!(sorted, shuffled);
        assert_eq!(shuffled.refunds[0].source_payment_id, oldest.payment_id);
    }

    #[test]
    fn test_same_date_uses_creation_time() {
        let mut later = payment(1, "100", PaymentMethod::Cash);
        later.created_utc = Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
        let mut earlier = payment(1, "100", PaymentMethod::Check);
        earlier.created_utc = Some(Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap());

        let result = RefundAllocator::allocate(dec("50"), &[later, earlier.clone()]);
        assert_eq!(result.refunds[0].source_payment_id, earlier.payment_id);
    }

    #[test]
    fn test_allocation_is_idempotent() {
        let payments = vec![
            payment(2, "75.25", PaymentMethod::Cash),
            payment(1, "20.10", PaymentMethod::BankTransfer),
        ];

        let first = RefundAllocator::allocate(dec("90.00"), &payments);
        let second = RefundAllocator::allocate(dec("90.00"), &payments);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_sum_equals_min_of_request_and_payments() {
        let payments = vec![
            payment(1, "10.01", PaymentMethod::Cash),
            payment(2, "20.02", PaymentMethod::Check),
            payment(3, "30.03", PaymentMethod::Other),
        ];
        let available = dec("60.06");

        for requested in ["0.01", "10.01", "10.02", "45", "60.06", "60.07", "1000"] {
            let requested = dec(requested);
            let result = RefundAllocator::allocate(requested, &payments);
            assert_eq!(result.total_refunded(), requested.min(available));
            assert_eq!(result.total_refunded() + result.unallocated, requested);
        }
    }

    #[test]
    fn test_prior_refunds_reduce_available_funds() {
        let first = payment(1, "200", PaymentMethod::Cash);
        let second = payment(5, "500", PaymentMethod::BankTransfer);
        let payments = vec![first.clone(), second.clone()];

        let earlier = RefundAllocator::allocate(dec("250"), &payments);
        let result = RefundAllocator::allocate_after(dec("100"), &payments, &earlier.refunds);

        assert!(result.success);
        assert_eq!(result.refunds.len(), 1);
        assert_eq!(result.refunds[0].source_payment_id, second.payment_id);
        assert_eq!(result.refunds[0].refund_amount, dec("100"));

        let exhausted =
            RefundAllocator::allocate_after(dec("1"), &[first.clone()], &earlier.refunds);
        assert!(!exhausted.success);
        assert_eq!(exhausted.errors[0].code(), "insufficient_funds");
    }

    #[test]
    fn test_issue_serializes_with_code_and_message() {
        let json = serde_json::to_value(AllocationIssue::NoPaymentsAvailable).unwrap();
        assert_eq!(json["code"], "no_payments_available");
        assert_eq!(json["message"], "no payments available to refund");
    }
}
