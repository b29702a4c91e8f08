//! # Energy Configuration

use crate::domain::EnergyError;
use serde::{Deserialize, Serialize};

/// Default energy cap.
pub const DEFAULT_MAX_ENERGY: u32 = 5;

/// Default time to regenerate one unit (30 minutes).
pub const DEFAULT_REGEN_INTERVAL_SECS: u64 = 1_800;

/// Energy service configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyConfig {
    /// Energy cap used when no server state is known.
    pub max_energy: u32,
    /// Seconds to regenerate one unit.
    pub regen_interval_secs: u64,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            max_energy: DEFAULT_MAX_ENERGY,
            regen_interval_secs: DEFAULT_REGEN_INTERVAL_SECS,
        }
    }
}

impl EnergyConfig {
    /// Create a config for testing (one unit per minute).
    pub fn for_testing() -> Self {
        Self {
            max_energy: DEFAULT_MAX_ENERGY,
            regen_interval_secs: 60,
        }
    }

    /// Regeneration interval in milliseconds.
    pub fn regen_interval_ms(&self) -> u64 {
        self.regen_interval_secs.saturating_mul(1_000)
    }

    /// Reject unusable values.
    pub fn validate(&self) -> Result<(), EnergyError> {
        if self.max_energy == 0 {
            return Err(EnergyError::InvalidConfig(
                "max_energy cannot be 0".to_string(),
            ));
        }
        if self.regen_interval_secs == 0 {
            return Err(EnergyError::InvalidConfig(
                "regen_interval_secs cannot be 0".to_string(),
            ));
        }
        Ok(())
    }
}
