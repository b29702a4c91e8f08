//! Prometheus metrics for the client state core.
//!
//! All metrics follow the naming convention: `rl_<concern>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, HistogramOpts, HistogramVec,
    Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // OPTIMISTIC OPERATIONS
    // =========================================================================

    /// Completed optimistic operations by outcome
    pub static ref OPTIMISTIC_OPERATIONS: CounterVec = CounterVec::new(
        Opts::new("rl_optimistic_operations_total", "Optimistic operations by outcome"),
        &["domain", "outcome"]  // outcome: success/rolled_back/network_error/validation_error/cancelled
    ).expect("metric creation failed");

    /// Rollbacks by category
    pub static ref ROLLBACKS: CounterVec = CounterVec::new(
        Opts::new("rl_rollbacks_total", "Speculative mutations reverted"),
        &["domain", "category"]
    ).expect("metric creation failed");

    /// End-to-end operation latency, remote call included
    pub static ref OPERATION_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "rl_operation_duration_seconds",
            "Time from validation to reconciliation"
        ).buckets(exponential_buckets(0.001, 2.0, 14).unwrap_or_default()),
        &["domain"]
    ).expect("metric creation failed");

    // =========================================================================
    // BATCHING
    // =========================================================================

    /// Batch flushes by outcome
    pub static ref BATCH_FLUSHES: CounterVec = CounterVec::new(
        Opts::new("rl_batch_flushes_total", "Batched delta flushes"),
        &["domain", "outcome"]  // outcome: accepted/rejected/requeued
    ).expect("metric creation failed");

    // =========================================================================
    // SESSION
    // =========================================================================

    /// Session state machine transitions
    pub static ref SESSION_TRANSITIONS: CounterVec = CounterVec::new(
        Opts::new("rl_session_transitions_total", "Run-session state transitions"),
        &["from", "to"]
    ).expect("metric creation failed");

    // =========================================================================
    // EVENT BUS
    // =========================================================================

    /// Notifications published by domain stores
    pub static ref EVENT_BUS_MESSAGES_SENT: Counter = Counter::new(
        "rl_event_bus_messages_sent_total",
        "Notifications published to the event bus"
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Calling this more than once is harmless.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(OPTIMISTIC_OPERATIONS.clone()),
        Box::new(ROLLBACKS.clone()),
        Box::new(OPERATION_DURATION.clone()),
        Box::new(BATCH_FLUSHES.clone()),
        Box::new(SESSION_TRANSITIONS.clone()),
        Box::new(EVENT_BUS_MESSAGES_SENT.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Record a finished optimistic operation.
pub fn record_operation(domain: &str, outcome: &str, seconds: f64) {
    OPTIMISTIC_OPERATIONS
        .with_label_values(&[domain, outcome])
        .inc();
    OPERATION_DURATION
        .with_label_values(&[domain])
        .observe(seconds);
}

/// Record a rollback.
pub fn record_rollback(domain: &str, category: &str) {
    ROLLBACKS.with_label_values(&[domain, category]).inc();
}

/// Record a batch flush.
pub fn record_batch_flush(domain: &str, outcome: &str) {
    BATCH_FLUSHES.with_label_values(&[domain, outcome]).inc();
}

/// Record a session transition.
pub fn record_session_transition(from: &str, to: &str) {
    SESSION_TRANSITIONS.with_label_values(&[from, to]).inc();
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }

    /// Seconds since the timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.elapsed_secs());
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
