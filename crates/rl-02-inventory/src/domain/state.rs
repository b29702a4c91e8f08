//! # Inventory State
//!
//! Owned items plus the item equipped in each slot. An item sits in at most
//! one slot; equipping it elsewhere moves it.

use super::entities::{InventoryRecord, Loadout};
use super::errors::InventoryError;
use shared_bus::ClientEvent;
use shared_optimistic::DomainState;
use shared_types::Domain;
use std::collections::BTreeSet;

/// Mutable inventory state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryState {
    owned: BTreeSet<String>,
    equipped: Loadout,
}

/// Immutable copy of [`InventoryState`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventorySnapshot {
    /// Owned item ids.
    pub owned: BTreeSet<String>,
    /// Equipped item per slot.
    pub equipped: Loadout,
}

impl InventoryState {
    /// State mirroring a server record.
    pub fn from_record(record: InventoryRecord) -> Self {
        Self {
            owned: record.owned,
            equipped: record.equipped,
        }
    }

    /// Whether `item` is owned.
    pub fn owns(&self, item: &str) -> bool {
        self.owned.contains(item)
    }

    /// Owned item ids.
    pub fn owned(&self) -> &BTreeSet<String> {
        &self.owned
    }

    /// Item equipped in `slot`.
    pub fn equipped(&self, slot: &str) -> Option<&str> {
        self.equipped.get(slot).map(String::as_str)
    }

    /// Every equipped slot.
    pub fn loadout(&self) -> &Loadout {
        &self.equipped
    }

    /// Check that `item` can go into `slot`.
    pub fn check_equip(&self, slot: &str, item: &str) -> Result<(), InventoryError> {
        if slot.is_empty() || item.is_empty() {
            return Err(InventoryError::EmptyId);
        }
        if !self.owns(item) {
            return Err(InventoryError::NotOwned(item.to_string()));
        }
        if self.equipped(slot) == Some(item) {
            return Err(InventoryError::AlreadyEquipped {
                slot: slot.to_string(),
                item: item.to_string(),
            });
        }
        Ok(())
    }

    /// Put `item` into `slot`, clearing any other slot that held it.
    pub fn equip(&mut self, slot: &str, item: &str) -> Result<(), InventoryError> {
        self.check_equip(slot, item)?;
        self.equipped.retain(|_, equipped| equipped != item);
        self.equipped.insert(slot.to_string(), item.to_string());
        Ok(())
    }

    /// Check that `slot` holds something.
    pub fn check_unequip(&self, slot: &str) -> Result<(), InventoryError> {
        if slot.is_empty() {
            return Err(InventoryError::EmptyId);
        }
        if self.equipped(slot).is_none() {
            return Err(InventoryError::SlotEmpty(slot.to_string()));
        }
        Ok(())
    }

    /// Empty `slot`, returning the item it held.
    pub fn unequip(&mut self, slot: &str) -> Result<String, InventoryError> {
        self.check_unequip(slot)?;
        self.equipped
            .remove(slot)
            .ok_or_else(|| InventoryError::SlotEmpty(slot.to_string()))
    }

    /// Check that `item` can be bought.
    pub fn check_purchase(&self, item: &str) -> Result<(), InventoryError> {
        if item.is_empty() {
            return Err(InventoryError::EmptyId);
        }
        if self.owns(item) {
            return Err(InventoryError::AlreadyOwned(item.to_string()));
        }
        Ok(())
    }

    /// Add `item` to the owned set.
    pub fn grant(&mut self, item: &str) -> Result<(), InventoryError> {
        self.check_purchase(item)?;
        self.owned.insert(item.to_string());
        Ok(())
    }

    /// Replace the equipped slots with the server's.
    pub fn set_loadout(&mut self, loadout: Loadout) {
        self.equipped = loadout;
    }

    /// Replace everything with a server record.
    pub fn replace(&mut self, record: InventoryRecord) {
        *self = Self::from_record(record);
    }
}

impl DomainState for InventoryState {
    type Snapshot = InventorySnapshot;
    const DOMAIN: Domain = Domain::Inventory;

    fn snapshot(&self) -> InventorySnapshot {
        InventorySnapshot {
            owned: self.owned.clone(),
            equipped: self.equipped.clone(),
        }
    }

    fn restore(&mut self, snapshot: InventorySnapshot) {
        self.owned = snapshot.owned;
        self.equipped = snapshot.equipped;
    }

    fn change_events(
        before: &InventorySnapshot,
        after: &InventorySnapshot,
        is_optimistic: bool,
    ) -> Vec<ClientEvent> {
        let ownership = before
            .owned
            .symmetric_difference(&after.owned)
            .map(|item| ClientEvent::ItemOwnershipChanged {
                item_id: item.clone(),
                owned: after.owned.contains(item),
                is_optimistic,
            });

        let slots: BTreeSet<&String> = before
            .equipped
            .keys()
            .chain(after.equipped.keys())
            .collect();
        let loadout = slots.into_iter().filter_map(|slot| {
            let previous = before.equipped.get(slot);
            let current = after.equipped.get(slot);
            (previous != current).then(|| ClientEvent::SlotChanged {
                slot: slot.clone(),
                previous: previous.cloned(),
                current: current.cloned(),
                is_optimistic,
            })
        });

        ownership.chain(loadout).collect()
    }
}
