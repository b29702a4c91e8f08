//! Server-side energy record.

use serde::{Deserialize, Serialize};
use shared_types::Timestamp;

/// Authoritative energy counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyRecord {
    /// Energy available.
    pub current: u32,
    /// Energy cap.
    pub max: u32,
    /// When regeneration was last accounted, in unix milliseconds.
    pub last_regen_at_ms: Timestamp,
}
