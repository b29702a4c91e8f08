//! Minimal domain used by this crate's unit tests.

use crate::state::DomainState;
use shared_bus::{ClientEvent, InMemoryEventBus};
use shared_types::{CurrencyType, Domain};
use std::sync::Arc;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Wallet {
    pub coins: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WalletSnapshot(pub u64);

impl DomainState for Wallet {
    type Snapshot = WalletSnapshot;
    const DOMAIN: Domain = Domain::Currency;

    fn snapshot(&self) -> WalletSnapshot {
        WalletSnapshot(self.coins)
    }

    fn restore(&mut self, snapshot: WalletSnapshot) {
        self.coins = snapshot.0;
    }

    fn change_events(
        before: &WalletSnapshot,
        after: &WalletSnapshot,
        is_optimistic: bool,
    ) -> Vec<ClientEvent> {
        if before == after {
            return Vec::new();
        }
        vec![ClientEvent::BalanceChanged {
            currency: CurrencyType::SoftCurrency,
            previous: before.0,
            current: after.0,
            is_optimistic,
        }]
    }
}

pub fn bus() -> Arc<InMemoryEventBus> {
    Arc::new(InMemoryEventBus::new())
}
