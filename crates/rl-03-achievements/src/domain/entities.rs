//! Achievement records, shared by local state and the gateway.

use serde::{Deserialize, Serialize};
use shared_types::CurrencyAmount;
use std::collections::BTreeMap;

/// One achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    /// Progress so far, never above `target`.
    pub progress: u32,
    /// Progress needed to unlock.
    pub target: u32,
    /// Progress reached the target.
    pub unlocked: bool,
    /// Reward has been claimed.
    pub claimed: bool,
    /// Credited to the ledger on claim.
    pub reward: CurrencyAmount,
}

impl Achievement {
    /// Fresh, locked achievement.
    pub fn new(target: u32, reward: CurrencyAmount) -> Self {
        Self {
            progress: 0,
            target,
            unlocked: target == 0,
            claimed: false,
            reward,
        }
    }

    /// Whether the reward can be claimed.
    pub fn is_claimable(&self) -> bool {
        self.unlocked && !self.claimed
    }
}

/// Achievements by id.
pub type AchievementBook = BTreeMap<String, Achievement>;
