//! # Client Telemetry
//!
//! Logging and metrics for the Rushlane client state core.
//!
//! ## Components
//!
//! - **Logs**: `tracing` with an `EnvFilter`, pretty or JSON output
//! - **Metrics**: Prometheus counters and histograms in a private registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use client_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env()).expect("telemetry");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RL_SERVICE_NAME` | `rushlane-client` | Service name in logs |
//! | `RL_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `RL_CONSOLE_OUTPUT` | `true` | Write log lines to stdout |
//! | `RL_JSON_LOGS` | `false` | JSON instead of pretty output |

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, record_batch_flush, record_operation, record_rollback,
    record_session_transition, register_metrics, HistogramTimer, MetricsHandle, BATCH_FLUSHES,
    EVENT_BUS_MESSAGES_SENT, OPERATION_DURATION, OPTIMISTIC_OPERATIONS, ROLLBACKS,
    SESSION_TRANSITIONS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that should be held for the lifetime of the client.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Metrics first; they don't depend on a subscriber
    let metrics_handle = register_metrics()?;
    init_logging(&config)?;

    Ok(TelemetryGuard {
        service_name: config.full_service_name(),
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
    _metrics: MetricsHandle,
}

impl TelemetryGuard {
    /// Service name the guard was initialised with.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Convenience macro for recording a metric with a value.
#[macro_export]
macro_rules! metric_observe {
    ($metric:expr, $value:expr) => {
        $metric.observe($value)
    };
    ($metric:expr, $labels:expr, $value:expr) => {
        $metric.with_label_values($labels).observe($value)
    };
}
