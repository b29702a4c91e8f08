//! Server-side records returned by the inventory gateway.

use serde::{Deserialize, Serialize};
use shared_types::CurrencyAmount;
use std::collections::{BTreeMap, BTreeSet};

/// Item equipped per slot.
pub type Loadout = BTreeMap<String, String>;

/// Full authoritative inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Every owned item id.
    pub owned: BTreeSet<String>,
    /// Equipped item per slot.
    pub equipped: Loadout,
}

/// Confirmation of an item purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    /// Item that changed hands.
    pub item_id: String,
    /// Price charged.
    pub price: CurrencyAmount,
}
