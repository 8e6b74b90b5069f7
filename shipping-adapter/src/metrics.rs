//! Adapter metrics

use prometheus::{
    register_histogram, register_int_counter_vec, Histogram, IntCounterVec,
};

lazy_static::lazy_static! {
    /// Requests by outcome
    pub static ref SHIPPING_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "shipping_estimate_requests_total",
        "Delivery estimate requests by outcome",
        &["outcome"]
    )
    .expect("shipping_estimate_requests_total registers once");

    /// Attempts by status code
    pub static ref SHIPPING_ATTEMPTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "shipping_estimate_attempts_total",
        "Delivery estimate attempts by gRPC status code",
        &["code"]
    )
    .expect("shipping_estimate_attempts_total registers once");

    /// End-to-end request duration
    pub static ref SHIPPING_REQUEST_DURATION: Histogram = register_histogram!(
        "shipping_estimate_duration_seconds",
        "Delivery estimate duration including retries",
        vec![0.005, 0.025, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0]
    )
    .expect("shipping_estimate_duration_seconds registers once");
}

/// Outcome label for a finished request
pub fn outcome_label(result: &crate::Result<i32>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(e) if e.is_translation() => "invalid_request",
        Err(crate::Error::Cancelled) | Err(crate::Error::DeadlineExceeded) => "cancelled",
        Err(_) => "failure",
    }
}
