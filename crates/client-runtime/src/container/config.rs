//! # Client Configuration
//!
//! Defaults for every tunable, overridable from the environment:
//!
//! - `RL_BUS_CAPACITY`: event bus buffer per subscriber (default 1000)
//! - `RL_TASK_FLUSH_INTERVAL_MS`: task batch flush interval (default 2000)
//! - `RL_ENERGY_MAX`: energy cap (default 5)
//! - `RL_ENERGY_REGEN_SECS`: seconds per regenerated unit (default 1800)
//!
//! Telemetry reads its own variables, see [`TelemetryConfig::from_env`].

use client_telemetry::TelemetryConfig;
use rl_04_tasks::{TaskConfig, TaskError};
use rl_05_energy::{EnergyConfig, EnergyError};
use serde::{Deserialize, Serialize};
use shared_bus::DEFAULT_CHANNEL_CAPACITY;
use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable did not parse.
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },

    /// The event bus needs room for at least one event.
    #[error("bus_capacity cannot be 0")]
    ZeroBusCapacity,

    /// Task settings rejected.
    #[error(transparent)]
    Tasks(#[from] TaskError),

    /// Energy settings rejected.
    #[error(transparent)]
    Energy(#[from] EnergyError),
}

/// Complete client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Event bus buffer per subscriber.
    pub bus_capacity: usize,
    /// Task batching.
    pub tasks: TaskConfig,
    /// Energy regeneration.
    pub energy: EnergyConfig,
    /// Logging and metrics.
    pub telemetry: TelemetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            bus_capacity: DEFAULT_CHANNEL_CAPACITY,
            tasks: TaskConfig::default(),
            energy: EnergyConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::from_vars(|var| env::var(var).ok())?;
        config.telemetry = TelemetryConfig::from_env();
        Ok(config)
    }

    /// Load from an arbitrary variable lookup. Telemetry keeps its defaults.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            bus_capacity: parse_var(&lookup, "RL_BUS_CAPACITY", defaults.bus_capacity)?,
            tasks: TaskConfig {
                flush_interval_ms: parse_var(
                    &lookup,
                    "RL_TASK_FLUSH_INTERVAL_MS",
                    defaults.tasks.flush_interval_ms,
                )?,
            },
            energy: EnergyConfig {
                max_energy: parse_var(&lookup, "RL_ENERGY_MAX", defaults.energy.max_energy)?,
                regen_interval_secs: parse_var(
                    &lookup,
                    "RL_ENERGY_REGEN_SECS",
                    defaults.energy.regen_interval_secs,
                )?,
            },
            telemetry: defaults.telemetry,
        })
    }

    /// Short intervals, quiet logs.
    pub fn for_testing() -> Self {
        Self {
            bus_capacity: 256,
            tasks: TaskConfig::for_testing(),
            energy: EnergyConfig::for_testing(),
            telemetry: TelemetryConfig::for_testing(),
        }
    }

    /// Reject unusable values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bus_capacity == 0 {
            return Err(ConfigError::ZeroBusCapacity);
        }
        self.tasks.validate()?;
        self.energy.validate()?;
        Ok(())
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value }),
    }
}
