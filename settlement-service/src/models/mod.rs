//! Domain models for settlement-service.

mod payment;
mod purchase;
mod purchase_return;
mod refund;
mod status;
mod timeline;

pub use payment::{Payment, PaymentMethod, PaymentStatus};
pub use purchase::{Purchase, PurchaseSnapshot, PurchaseStatus};
pub use purchase_return::{PurchaseReturn, RefundStatus, ReturnStatus};
pub use refund::{AllocationIssue, RefundAllocation, RefundTransaction};
pub use status::{CompletePaymentStatus, DisplayStatus, Severity};
pub use timeline::{has_balance_resolved, TimelineEvent, TimelineEventType};
