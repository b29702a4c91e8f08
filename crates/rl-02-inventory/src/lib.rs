//! # RL-02 Inventory
//!
//! Owned items and the equipped loadout.
//!
//! **Architecture:** Hexagonal (Domain + Ports/Adapters)
//!
//! ## Purpose
//!
//! - `equip` / `unequip` update the loadout instantly and adopt the
//!   server's loadout on confirmation
//! - `purchase` grants the item and debits its price through the currency
//!   ledger, all or nothing
//!
//! ## Invariants
//!
//! - Only owned items can be equipped
//! - An item occupies at most one slot

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    InventoryError, InventoryRecord, InventorySnapshot, InventoryState, Loadout, PurchaseReceipt,
};
pub use ports::{InventoryApi, InventoryGateway};
pub use service::InventoryService;
