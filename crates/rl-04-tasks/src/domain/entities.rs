//! Task records, shared by local state and the gateway.

use serde::{Deserialize, Serialize};
use shared_types::CurrencyAmount;
use std::collections::BTreeMap;

/// One task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Progress so far.
    pub progress: u32,
    /// Progress needed to complete.
    pub target: u32,
    /// Reward has been claimed.
    pub claimed: bool,
    /// Credited to the ledger on claim.
    pub reward: CurrencyAmount,
}

impl Task {
    /// Fresh task with no progress.
    pub fn new(target: u32, reward: CurrencyAmount) -> Self {
        Self {
            progress: 0,
            target,
            claimed: false,
            reward,
        }
    }

    /// Progress reached the target.
    pub fn is_completed(&self) -> bool {
        self.progress >= self.target
    }
}

/// Tasks by id.
pub type TaskBook = BTreeMap<String, Task>;
