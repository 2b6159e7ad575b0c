pub mod health;
pub mod metrics;
pub mod payment_status;
pub mod refunds;

pub use health::{health_check, readiness_check};
pub use metrics::metrics;
pub use payment_status::{compute_payment_status, get_payment_status};
pub use refunds::{preview_refund, process_refund, retry_refund};
