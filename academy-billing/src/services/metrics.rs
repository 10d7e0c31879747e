//! Prometheus metrics for academy-billing.
//!
//! Recording helpers are no-ops until [`init_metrics`] has been called.

use prometheus::{
    histogram_opts, opts, register_counter, register_histogram_vec, register_int_counter_vec,
    Counter, Encoder, HistogramVec, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;
use tracing::warn;

/// Backend request duration by operation
pub static BACKEND_REQUEST_DURATION: OnceLock<HistogramVec> = OnceLock::new();

/// Backend requests by operation and outcome
pub static BACKEND_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Receipts issued and voided
pub static RECEIPTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Payments applied by payment method
pub static PAYMENTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Sum of applied payment amounts
pub static PAYMENT_AMOUNT_TOTAL: OnceLock<Counter> = OnceLock::new();

/// Linked-period settlements by outcome
pub static PERIOD_SETTLEMENTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Error counter for alerting
pub static ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

fn install<T>(cell: &OnceLock<T>, name: &str, metric: prometheus::Result<T>) {
    match metric {
        Ok(metric) => {
            let _ = cell.set(metric);
        }
        Err(e) => warn!(metric = name, error = %e, "Failed to register metric"),
    }
}

/// Register all metrics with the default registry. Safe to call more than once.
pub fn init_metrics() {
    if BACKEND_REQUEST_DURATION.get().is_none() {
        install(
            &BACKEND_REQUEST_DURATION,
            "academy_billing_backend_request_duration_seconds",
            register_histogram_vec!(
                histogram_opts!(
                    "academy_billing_backend_request_duration_seconds",
                    "Backend request duration",
                    vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
                ),
                &["operation"]
            ),
        );
    }

    if BACKEND_REQUESTS_TOTAL.get().is_none() {
        install(
            &BACKEND_REQUESTS_TOTAL,
            "academy_billing_backend_requests_total",
            register_int_counter_vec!(
                opts!(
                    "academy_billing_backend_requests_total",
                    "Total backend requests by operation and outcome"
                ),
                &["operation", "outcome"]
            ),
        );
    }

    if RECEIPTS_TOTAL.get().is_none() {
        install(
            &RECEIPTS_TOTAL,
            "academy_billing_receipts_total",
            register_int_counter_vec!(
                opts!(
                    "academy_billing_receipts_total",
                    "Total receipts by lifecycle event"
                ),
                &["event"] // issued, voided
            ),
        );
    }

    if PAYMENTS_TOTAL.get().is_none() {
        install(
            &PAYMENTS_TOTAL,
            "academy_billing_payments_total",
            register_int_counter_vec!(
                opts!(
                    "academy_billing_payments_total",
                    "Total payments applied by payment method"
                ),
                &["method_id"]
            ),
        );
    }

    if PAYMENT_AMOUNT_TOTAL.get().is_none() {
        install(
            &PAYMENT_AMOUNT_TOTAL,
            "academy_billing_payment_amount_total",
            register_counter!(opts!(
                "academy_billing_payment_amount_total",
                "Total amount of applied payments"
            )),
        );
    }

    if PERIOD_SETTLEMENTS_TOTAL.get().is_none() {
        install(
            &PERIOD_SETTLEMENTS_TOTAL,
            "academy_billing_period_settlements_total",
            register_int_counter_vec!(
                opts!(
                    "academy_billing_period_settlements_total",
                    "Linked payment periods marked paid, by outcome"
                ),
                &["outcome"]
            ),
        );
    }

    if ERRORS_TOTAL.get().is_none() {
        install(
            &ERRORS_TOTAL,
            "academy_billing_errors_total",
            register_int_counter_vec!(
                opts!("academy_billing_errors_total", "Total errors by type"),
                &["error_type", "operation"]
            ),
        );
    }
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Record one backend call.
pub fn record_backend_request(operation: &str, outcome: &str, duration_secs: f64) {
    if let Some(counter) = BACKEND_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[operation, outcome]).inc();
    }
    if let Some(histogram) = BACKEND_REQUEST_DURATION.get() {
        histogram
            .with_label_values(&[operation])
            .observe(duration_secs);
    }
}

/// Record a receipt lifecycle event.
pub fn record_receipt_event(event: &str) {
    if let Some(counter) = RECEIPTS_TOTAL.get() {
        counter.with_label_values(&[event]).inc();
    }
}

/// Record an applied payment.
pub fn record_payment(method_id: i64, amount: f64) {
    if let Some(counter) = PAYMENTS_TOTAL.get() {
        counter.with_label_values(&[&method_id.to_string()]).inc();
    }
    if let Some(counter) = PAYMENT_AMOUNT_TOTAL.get() {
        counter.inc_by(amount.abs());
    }
}

/// Record the outcome of one linked-period settlement.
pub fn record_period_settlement(outcome: &str) {
    if let Some(counter) = PERIOD_SETTLEMENTS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

/// Record an error for alerting.
pub fn record_error(error_type: &str, operation: &str) {
    if let Some(counter) = ERRORS_TOTAL.get() {
        counter.with_label_values(&[error_type, operation]).inc();
    }
}
