//! # Metrics
//!
//! Prometheus metrics for monitoring the operator.
//!
//! ## Metrics Exposed
//!
//! - `sops_operator_reconciliations_total` - Total number of reconciliations
//! - `sops_operator_reconciliation_errors_total` - Reconciliations returned to the queue with an error
//! - `sops_operator_reconciliation_duration_seconds` - Duration of reconciliation passes
//! - `sops_operator_validation_failures_total` - Payloads rejected before decryption
//! - `sops_operator_decrypt_attempts_total` - sops invocations attempted
//! - `sops_operator_decrypt_failures_total{reason}` - sops failures by reason code
//! - `sops_operator_secrets_created_total` / `..._updated_total` / `..._deleted_total`

use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "sops_operator_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "sops_operator_reconciliation_errors_total",
        "Total number of reconciliation errors returned to the queue",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "sops_operator_reconciliation_duration_seconds",
            "Duration of reconciliation passes in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static VALIDATION_FAILURES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "sops_operator_validation_failures_total",
        "Payloads rejected by structural validation",
    )
    .expect("Failed to create VALIDATION_FAILURES_TOTAL metric - this should never happen")
});

static DECRYPT_ATTEMPTS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "sops_operator_decrypt_attempts_total",
        "Total number of sops decrypt invocations",
    )
    .expect("Failed to create DECRYPT_ATTEMPTS_TOTAL metric - this should never happen")
});

static DECRYPT_FAILURES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "sops_operator_decrypt_failures_total",
            "Total number of sops decrypt failures by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create DECRYPT_FAILURES_TOTAL metric - this should never happen")
});

static DECRYPT_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "sops_operator_decrypt_duration_seconds",
            "Duration of sops decrypt invocations in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 30.0]),
    )
    .expect("Failed to create DECRYPT_DURATION metric - this should never happen")
});

static SECRETS_CREATED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "sops_operator_secrets_created_total",
        "Derived Secrets created",
    )
    .expect("Failed to create SECRETS_CREATED_TOTAL metric - this should never happen")
});

static SECRETS_UPDATED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "sops_operator_secrets_updated_total",
        "Derived Secrets updated in place",
    )
    .expect("Failed to create SECRETS_UPDATED_TOTAL metric - this should never happen")
});

static SECRETS_DELETED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "sops_operator_secrets_deleted_total",
        "Derived Secrets deleted during finalization",
    )
    .expect("Failed to create SECRETS_DELETED_TOTAL metric - this should never happen")
});

pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(VALIDATION_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(DECRYPT_ATTEMPTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(DECRYPT_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(DECRYPT_DURATION.clone()))?;
    REGISTRY.register(Box::new(SECRETS_CREATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SECRETS_UPDATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SECRETS_DELETED_TOTAL.clone()))?;
    Ok(())
}

pub fn inc_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn inc_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconcile_duration(seconds: f64) {
    RECONCILIATION_DURATION.observe(seconds);
}

pub fn inc_validation_failures() {
    VALIDATION_FAILURES_TOTAL.inc();
}

pub fn inc_decrypt_attempts() {
    DECRYPT_ATTEMPTS_TOTAL.inc();
}

pub fn inc_decrypt_failures(reason: &str) {
    DECRYPT_FAILURES_TOTAL.with_label_values(&[reason]).inc();
}

pub fn observe_decrypt_duration(seconds: f64) {
    DECRYPT_DURATION.observe(seconds);
}

pub fn inc_secrets_created() {
    SECRETS_CREATED_TOTAL.inc();
}

pub fn inc_secrets_updated() {
    SECRETS_UPDATED_TOTAL.inc();
}

pub fn inc_secrets_deleted() {
    SECRETS_DELETED_TOTAL.inc();
}
