//! # Domain Layer
//!
//! Inventory state, its snapshot and validation errors.

pub mod entities;
pub mod errors;
pub mod state;

pub use entities::{InventoryRecord, Loadout, PurchaseReceipt};
pub use errors::InventoryError;
pub use state::{InventorySnapshot, InventoryState};
