//! Server-side records returned by the currency gateway.

use serde::{Deserialize, Serialize};
use shared_types::CurrencyType;
use std::collections::BTreeMap;

/// Authoritative balance after an accepted add or spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceReceipt {
    /// Currency that moved.
    pub currency: CurrencyType,
    /// Balance on the server after the mutation.
    pub balance: u64,
}

/// Full authoritative balance sheet.
pub type BalanceSheet = BTreeMap<CurrencyType, u64>;
