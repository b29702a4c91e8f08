//! # Domain Errors

use thiserror::Error;

/// Inventory validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// Item and slot ids must be non-empty.
    #[error("Identifier must not be empty")]
    EmptyId,

    /// Only owned items can be equipped.
    #[error("Item not owned: {0}")]
    NotOwned(String),

    /// The item is already in the inventory.
    #[error("Item already owned: {0}")]
    AlreadyOwned(String),

    /// The slot already holds this item.
    #[error("Item {item} already equipped in {slot}")]
    AlreadyEquipped {
        /// Slot identifier.
        slot: String,
        /// Item identifier.
        item: String,
    },

    /// Nothing to unequip.
    #[error("Slot is empty: {0}")]
    SlotEmpty(String),

    /// Purchases must cost something.
    #[error("Price must be greater than zero")]
    ZeroPrice,
}
