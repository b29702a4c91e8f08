//! # Task Configuration

use crate::domain::TaskError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default batch flush interval.
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 2_000;

/// Tasks service configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Interval between batched progress flushes, in milliseconds.
    pub flush_interval_ms: u64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
        }
    }
}

impl TaskConfig {
    /// Create a config for testing (short interval).
    pub fn for_testing() -> Self {
        Self {
            flush_interval_ms: 100,
        }
    }

    /// Flush interval as a duration.
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    /// Reject unusable values.
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.flush_interval_ms == 0 {
            return Err(TaskError::InvalidConfig(
                "flush_interval_ms cannot be 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TaskConfig::default();
        assert_eq!(config.flush_interval(), Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = TaskConfig {
            flush_interval_ms: 0,
        };
        assert!(matches!(config.validate(), Err(TaskError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_deserializes() {
        let config: TaskConfig = serde_json::from_str(r#"{"flush_interval_ms":500}"#).unwrap();
        assert_eq!(config.flush_interval_ms, 500);
    }
}
