//! # Inbound Ports

use crate::domain::{Loadout, PurchaseReceipt};
use async_trait::async_trait;
use shared_types::{CurrencyAmount, OperationResult};

/// Inventory API - inbound port.
#[async_trait]
pub trait InventoryApi: Send + Sync {
    /// Equip an owned item. Returns the authoritative loadout.
    async fn equip(&self, slot: &str, item: &str) -> OperationResult<Loadout>;

    /// Empty a slot. Returns the authoritative loadout.
    async fn unequip(&self, slot: &str) -> OperationResult<Loadout>;

    /// Buy an item, debiting `price` from the ledger.
    async fn purchase(&self, item: &str, price: CurrencyAmount)
        -> OperationResult<PurchaseReceipt>;

    /// Whether the item is owned locally.
    fn owns(&self, item: &str) -> bool;

    /// Item equipped in `slot`, if any.
    fn equipped(&self, slot: &str) -> Option<String>;

    /// Every equipped slot.
    fn loadout(&self) -> Loadout;

    /// Overwrite local inventory with the server's.
    async fn sync(&self) -> OperationResult<()>;

    /// Drop all local state (sign-out).
    fn reset(&self);
}
