//! # Inventory Service
//!
//! Equip and unequip are plain optimistic operations. A purchase marks the
//! item owned and debits the price through the [`Ledger`] in one
//! all-or-nothing step.

use crate::domain::{InventoryError, InventoryState, Loadout, PurchaseReceipt};
use crate::ports::{InventoryApi, InventoryGateway};
use async_trait::async_trait;
use shared_bus::EventPublisher;
use shared_optimistic::{execute, execute_dual, synchronize, DomainStore, DualOp, Ledger, OptimisticOp};
use shared_types::{CurrencyAmount, GatewayError, LedgerEntry, OperationResult, RemoteReply};
use std::sync::Arc;
use tracing::{debug, info};

/// Inventory domain service.
pub struct InventoryService<G: InventoryGateway, L: Ledger> {
    store: DomainStore<InventoryState>,
    gateway: Arc<G>,
    ledger: Arc<L>,
}

impl<G: InventoryGateway, L: Ledger> InventoryService<G, L> {
    /// Create a service with an empty inventory.
    pub fn new(gateway: Arc<G>, ledger: Arc<L>, bus: Arc<dyn EventPublisher>) -> Self {
        Self {
            store: DomainStore::new(bus),
            gateway,
            ledger,
        }
    }

    /// Create a service with a known starting inventory.
    pub fn with_state(
        gateway: Arc<G>,
        ledger: Arc<L>,
        bus: Arc<dyn EventPublisher>,
        state: InventoryState,
    ) -> Self {
        Self {
            store: DomainStore::with_state(state, bus),
            gateway,
            ledger,
        }
    }

    /// Whether an inventory operation is in flight.
    pub fn is_pending(&self) -> bool {
        self.store.is_pending()
    }
}

struct Equip<'a, G: InventoryGateway> {
    gateway: &'a G,
    slot: &'a str,
    item: &'a str,
}

#[async_trait]
impl<'a, G: InventoryGateway> OptimisticOp<InventoryState> for Equip<'a, G> {
    type Output = Loadout;
    type Error = InventoryError;

    fn name(&self) -> &'static str {
        "inventory.equip"
    }

    fn validate(&self, state: &InventoryState) -> Result<(), InventoryError> {
        state.check_equip(self.slot, self.item)
    }

    fn speculate(&self, state: &mut InventoryState) -> Result<(), InventoryError> {
        state.equip(self.slot, self.item)?;
        debug!(slot = self.slot, item = self.item, "Speculative equip");
        Ok(())
    }

    async fn commit(&self) -> Result<RemoteReply<Loadout>, GatewayError> {
        self.gateway.equip_item(self.slot, self.item).await
    }

    fn reconcile(&self, state: &mut InventoryState, loadout: &Loadout) {
        state.set_loadout(loadout.clone());
    }
}

struct Unequip<'a, G: InventoryGateway> {
    gateway: &'a G,
    slot: &'a str,
}

#[async_trait]
impl<'a, G: InventoryGateway> OptimisticOp<InventoryState> for Unequip<'a, G> {
    type Output = Loadout;
    type Error = InventoryError;

    fn name(&self) -> &'static str {
        "inventory.unequip"
    }

    fn validate(&self, state: &InventoryState) -> Result<(), InventoryError> {
        state.check_unequip(self.slot)
    }

    fn speculate(&self, state: &mut InventoryState) -> Result<(), InventoryError> {
        let removed = state.unequip(self.slot)?;
        debug!(slot = self.slot, item = %removed, "Speculative unequip");
        Ok(())
    }

    async fn commit(&self) -> Result<RemoteReply<Loadout>, GatewayError> {
        self.gateway.unequip_slot(self.slot).await
    }

    fn reconcile(&self, state: &mut InventoryState, loadout: &Loadout) {
        state.set_loadout(loadout.clone());
    }
}

struct Purchase<'a, G: InventoryGateway> {
    gateway: &'a G,
    item: &'a str,
    price: CurrencyAmount,
}

#[async_trait]
impl<'a, G: InventoryGateway> DualOp<InventoryState> for Purchase<'a, G> {
    type Output = PurchaseReceipt;
    type Error = InventoryError;

    fn name(&self) -> &'static str {
        "inventory.purchase"
    }

    fn validate(&self, state: &InventoryState) -> Result<Option<LedgerEntry>, InventoryError> {
        if self.price.amount == 0 {
            return Err(InventoryError::ZeroPrice);
        }
        state.check_purchase(self.item)?;
        Ok(Some(LedgerEntry::Debit(self.price)))
    }

    fn mark(&self, state: &mut InventoryState) -> Result<(), InventoryError> {
        state.grant(self.item)
    }

    async fn confirm(&self) -> Result<RemoteReply<PurchaseReceipt>, GatewayError> {
        self.gateway.purchase_item(self.item, self.price).await
    }
}

#[async_trait]
impl<G: InventoryGateway, L: Ledger> InventoryApi for InventoryService<G, L> {
    async fn equip(&self, slot: &str, item: &str) -> OperationResult<Loadout> {
        let op = Equip {
            gateway: self.gateway.as_ref(),
            slot,
            item,
        };
        execute(&self.store, &op).await
    }

    async fn unequip(&self, slot: &str) -> OperationResult<Loadout> {
        let op = Unequip {
            gateway: self.gateway.as_ref(),
            slot,
        };
        execute(&self.store, &op).await
    }

    async fn purchase(
        &self,
        item: &str,
        price: CurrencyAmount,
    ) -> OperationResult<PurchaseReceipt> {
        let op = Purchase {
            gateway: self.gateway.as_ref(),
            item,
            price,
        };
        let result = execute_dual(&self.store, self.ledger.as_ref(), &op).await;
        if result.is_success() {
            info!(item, price = %price, "Item purchased");
        }
        result
    }

    fn owns(&self, item: &str) -> bool {
        self.store.read(|state| state.owns(item))
    }

    fn equipped(&self, slot: &str) -> Option<String> {
        self.store
            .read(|state| state.equipped(slot).map(str::to_string))
    }

    fn loadout(&self) -> Loadout {
        self.store.read(|state| state.loadout().clone())
    }

    async fn sync(&self) -> OperationResult<()> {
        synchronize(
            &self.store,
            "inventory.sync",
            self.gateway.fetch_inventory(),
            InventoryState::replace,
        )
        .await
        .map(|_| ())
    }

    fn reset(&self) {
        self.store.reset();
    }
}
