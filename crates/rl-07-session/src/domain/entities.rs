//! # Session Entities

use serde::{Deserialize, Serialize};
use shared_types::{CurrencyAmount, Timestamp};

/// What the client asks for when starting a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    /// Track or game mode identifier.
    pub track_id: String,
    /// Client build, checked server side.
    pub client_version: String,
}

/// Server grant for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTicket {
    /// Identifier the result must be submitted under.
    pub session_id: String,
    /// Seed for the run's procedural layout.
    pub seed: u64,
    /// Server time of the grant.
    pub issued_at_ms: Timestamp,
}

/// Outcome of a finished run, as reported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Final score.
    pub score: u64,
    /// Distance covered in metres.
    pub distance: u64,
    /// Coins picked up.
    pub coins: u32,
}

/// Server verdict on a submitted run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReceipt {
    /// Session the verdict belongs to.
    pub session_id: String,
    /// Score after server verification.
    pub accepted_score: u64,
    /// Currency granted for the run.
    pub reward: CurrencyAmount,
}
