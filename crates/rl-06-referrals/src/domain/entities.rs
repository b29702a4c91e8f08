//! Referral records, shared by local state and the gateway.

use serde::{Deserialize, Serialize};
use shared_types::CurrencyAmount;
use std::collections::BTreeMap;

/// Shortest accepted referral code.
pub const MIN_CODE_LEN: usize = 4;

/// Longest accepted referral code.
pub const MAX_CODE_LEN: usize = 16;

/// A player who signed up with this player's code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referee {
    /// Credited to the ledger on claim.
    pub reward: CurrencyAmount,
    /// Reward has been claimed.
    pub claimed: bool,
}

/// Full referral status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralRecord {
    /// This player's own code, once issued.
    pub own_code: Option<String>,
    /// Code this player was referred by.
    pub referred_by: Option<String>,
    /// Players referred by this player.
    pub referees: BTreeMap<String, Referee>,
}
