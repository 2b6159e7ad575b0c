//! Prometheus metrics for settlement-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// HTTP request counter by route and status.
pub static HTTP_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "settlement_http_requests_total",
        "Total number of HTTP requests",
        &["route", "status"]
    )
    .expect("Failed to register http_requests_total")
});

/// HTTP request duration histogram by route.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "settlement_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["route"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("Failed to register http_request_duration")
});

/// Status computations by resulting display status.
pub static STATUS_COMPUTATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "settlement_status_computations_total",
        "Total number of payment status computations",
        &["display_status"]
    )
    .expect("Failed to register status_computations_total")
});

/// Refund allocations by outcome.
pub static REFUND_ALLOCATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "settlement_refund_allocations_total",
        "Total number of refund allocations",
        &["outcome"] // full, partial, rejected
    )
    .expect("Failed to register refund_allocations_total")
});

/// Refund workflow runs by final refund status.
pub static REFUND_OUTCOMES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "settlement_refund_outcomes_total",
        "Total number of processed refunds by resulting status",
        &["refund_status"]
    )
    .expect("Failed to register refund_outcomes_total")
});

/// Status cache lookups.
pub static CACHE_LOOKUPS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "settlement_cache_lookups_total",
        "Total number of status cache lookups",
        &["result"] // hit, joined, loaded
    )
    .expect("Failed to register cache_lookups_total")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "settlement_errors_total",
        "Total number of errors by type",
        &["error_type"]
    )
    .expect("Failed to register errors_total")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&HTTP_REQUESTS_TOTAL);
    Lazy::force(&HTTP_REQUEST_DURATION);
    Lazy::force(&STATUS_COMPUTATIONS_TOTAL);
    Lazy::force(&REFUND_ALLOCATIONS_TOTAL);
    Lazy::force(&REFUND_OUTCOMES_TOTAL);
    Lazy::force(&CACHE_LOOKUPS_TOTAL);
    Lazy::force(&ERRORS_TOTAL);
}

/// Record the outcome of a refund allocation.
pub fn record_allocation(allocation: &crate::models::RefundAllocation) {
    let outcome = if !allocation.success {
        "rejected"
    } else if allocation.is_partial() {
        "partial"
    } else {
        "full"
    };
    REFUND_ALLOCATIONS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
