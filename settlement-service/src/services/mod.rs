//! Services for settlement-service.

pub mod cache;
pub mod error;
pub mod metrics;
pub mod payment_status;
pub mod refund_allocator;
pub mod refund_processor;
pub mod status_service;
pub mod store;

pub use cache::RequestCache;
pub use error::{SettlementError, StoreError};
pub use payment_status::PaymentStatusCalculator;
pub use refund_allocator::RefundAllocator;
pub use refund_processor::{RefundOutcome, RefundProcessor};
pub use status_service::{PaymentStatusService, StatusCache};
pub use store::{InMemorySettlementStore, SettlementStore};
