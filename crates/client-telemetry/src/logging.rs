//! Structured logging setup.
//!
//! Every log line carries consistent fields so a log pipeline can index them:
//! - `domain`: Owning domain (currency, tasks, ...)
//! - `operation`: Operation name, e.g. `currency.add`
//! - `operation_id`: Correlates speculative, confirm and rollback lines
//! - `category`: Rollback category, when relevant

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Install the global tracing subscriber.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(format!("invalid log filter: {e}")))?;

    if !config.console_output {
        return tracing_subscriber::registry()
            .with(env_filter)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()));
    }

    if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    tracing::info!(
        service = %config.full_service_name(),
        json = config.json_logs,
        "Logging initialized"
    );

    Ok(())
}

/// Helper to create structured log entries with a domain field.
#[macro_export]
macro_rules! log_event {
    (info, $domain:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            domain = $domain,
            $($($field)*,)?
            $msg
        )
    };

    (warn, $domain:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            domain = $domain,
            $($($field)*,)?
            $msg
        )
    };

    (error, $domain:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            domain = $domain,
            $($($field)*,)?
            $msg
        )
    };

    (debug, $domain:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            domain = $domain,
            $($($field)*,)?
            $msg
        )
    };
}
