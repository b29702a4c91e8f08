//! # Outbound Ports
//!
//! The remote authority for owned and equipped items.

use crate::domain::{InventoryRecord, Loadout, PurchaseReceipt};
use async_trait::async_trait;
use shared_types::{CurrencyAmount, GatewayError, RemoteReply};

/// Server gateway for the inventory domain.
#[async_trait]
pub trait InventoryGateway: Send + Sync {
    /// Equip `item` into `slot`. Replies with the full loadout.
    async fn equip_item(
        &self,
        slot: &str,
        item: &str,
    ) -> Result<RemoteReply<Loadout>, GatewayError>;

    /// Empty `slot`. Replies with the full loadout.
    async fn unequip_slot(&self, slot: &str) -> Result<RemoteReply<Loadout>, GatewayError>;

    /// Record the purchase of `item`.
    async fn purchase_item(
        &self,
        item: &str,
        price: CurrencyAmount,
    ) -> Result<RemoteReply<PurchaseReceipt>, GatewayError>;

    /// Fetch the whole inventory.
    async fn fetch_inventory(&self) -> Result<InventoryRecord, GatewayError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    #[derive(Debug, Clone)]
    pub enum Scripted {
        Reject(String),
        Conflict(String),
        Fail(GatewayError),
    }

    /// Mock gateway keeping its own authoritative inventory.
    #[derive(Default)]
    pub struct MockInventoryGateway {
        pub server: Mutex<InventoryRecord>,
        pub script: Mutex<VecDeque<Scripted>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl MockInventoryGateway {
        pub fn owning(items: &[&str]) -> Self {
            let gateway = Self::default();
            gateway
                .server
                .lock()
                .owned
                .extend(items.iter().map(|item| item.to_string()));
            gateway
        }

        pub fn push(&self, scripted: Scripted) {
            self.script.lock().push_back(scripted);
        }

        fn scripted<T>(&self, call: &str) -> Option<Result<RemoteReply<T>, GatewayError>> {
            self.calls.lock().push(call.to_string());
            match self.script.lock().pop_front()? {
                Scripted::Reject(reason) => Some(Ok(RemoteReply::Rejected(reason))),
                Scripted::Conflict(reason) => Some(Ok(RemoteReply::Conflict(reason))),
                Scripted::Fail(error) => Some(Err(error)),
            }
        }
    }

    #[async_trait]
    impl InventoryGateway for MockInventoryGateway {
        async fn equip_item(
            &self,
            slot: &str,
            item: &str,
        ) -> Result<RemoteReply<Loadout>, GatewayError> {
            if let Some(reply) = self.scripted("equip") {
                return reply;
            }
            let mut server = self.server.lock();
            if !server.owned.contains(item) {
                return Ok(RemoteReply::Conflict(format!("{item} not owned")));
            }
            server.equipped.retain(|_, equipped| equipped != item);
            server.equipped.insert(slot.to_string(), item.to_string());
            Ok(RemoteReply::Accepted(server.equipped.clone()))
        }

        async fn unequip_slot(&self, slot: &str) -> Result<RemoteReply<Loadout>, GatewayError> {
            if let Some(reply) = self.scripted("unequip") {
                return reply;
            }
            let mut server = self.server.lock();
            server.equipped.remove(slot);
            Ok(RemoteReply::Accepted(server.equipped.clone()))
        }

        async fn purchase_item(
            &self,
            item: &str,
            price: CurrencyAmount,
        ) -> Result<RemoteReply<PurchaseReceipt>, GatewayError> {
            if let Some(reply) = self.scripted("purchase") {
                return reply;
            }
            self.server.lock().owned.insert(item.to_string());
            Ok(RemoteReply::Accepted(PurchaseReceipt {
                item_id: item.to_string(),
                price,
            }))
        }

        async fn fetch_inventory(&self) -> Result<InventoryRecord, GatewayError> {
            Ok(self.server.lock().clone())
        }
    }
}
