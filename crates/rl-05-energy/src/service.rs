//! # Energy Service

use crate::config::EnergyConfig;
use crate::domain::{EnergyError, EnergyRecord, EnergyState};
use crate::ports::{EnergyApi, EnergyGateway};
use async_trait::async_trait;
use shared_bus::EventPublisher;
use shared_optimistic::{execute, execute_dual, synchronize, DomainStore, DualOp, Ledger, OptimisticOp};
use shared_types::{
    CurrencyAmount, GatewayError, LedgerEntry, OperationResult, RemoteReply, TimeSource, Timestamp,
};
use std::sync::Arc;
use tracing::debug;

/// Energy domain service.
pub struct EnergyService<G: EnergyGateway, L: Ledger> {
    store: DomainStore<EnergyState>,
    gateway: Arc<G>,
    ledger: Arc<L>,
    clock: Arc<dyn TimeSource>,
    regen_interval_ms: u64,
}

impl<G: EnergyGateway, L: Ledger> EnergyService<G, L> {
    /// Create a service starting at full energy.
    pub fn new(
        config: &EnergyConfig,
        gateway: Arc<G>,
        ledger: Arc<L>,
        clock: Arc<dyn TimeSource>,
        bus: Arc<dyn EventPublisher>,
    ) -> Self {
        let state = EnergyState::full(config.max_energy, clock.now());
        Self {
            store: DomainStore::with_state(state, bus),
            gateway,
            ledger,
            clock,
            regen_interval_ms: config.regen_interval_ms(),
        }
    }
}

struct Consume<'a, G: EnergyGateway> {
    gateway: &'a G,
    amount: u32,
    reason: &'a str,
    now: Timestamp,
}

#[async_trait]
impl<'a, G: EnergyGateway> OptimisticOp<EnergyState> for Consume<'a, G> {
    type Output = EnergyRecord;
    type Error = EnergyError;

    fn name(&self) -> &'static str {
        "energy.consume"
    }

    fn validate(&self, state: &EnergyState) -> Result<(), EnergyError> {
        state.check_consume(self.amount)
    }

    fn speculate(&self, state: &mut EnergyState) -> Result<(), EnergyError> {
        state.consume(self.amount, self.now).map(|_| ())
    }

    async fn commit(&self) -> Result<RemoteReply<EnergyRecord>, GatewayError> {
        self.gateway.consume_energy(self.amount, self.reason).await
    }

    fn reconcile(&self, state: &mut EnergyState, record: &EnergyRecord) {
        state.replace(*record);
    }
}

struct Refill<'a, G: EnergyGateway> {
    gateway: &'a G,
    price: CurrencyAmount,
    now: Timestamp,
}

#[async_trait]
impl<'a, G: EnergyGateway> DualOp<EnergyState> for Refill<'a, G> {
    type Output = EnergyRecord;
    type Error = EnergyError;

    fn name(&self) -> &'static str {
        "energy.refill"
    }

    fn validate(&self, state: &EnergyState) -> Result<Option<LedgerEntry>, EnergyError> {
        if self.price.amount == 0 {
            return Err(EnergyError::ZeroPrice);
        }
        state.check_refill()?;
        Ok(Some(LedgerEntry::Debit(self.price)))
    }

    fn mark(&self, state: &mut EnergyState) -> Result<(), EnergyError> {
        state.refill(self.now)
    }

    async fn confirm(&self) -> Result<RemoteReply<EnergyRecord>, GatewayError> {
        self.gateway.refill_energy(self.price).await
    }

    fn reconcile(&self, state: &mut EnergyState, record: &EnergyRecord) {
        state.replace(*record);
    }
}

#[async_trait]
impl<G: EnergyGateway, L: Ledger> EnergyApi for EnergyService<G, L> {
    fn regenerate(&self) -> u32 {
        let now = self.clock.now();
        let interval = self.regen_interval_ms;
        self.store.mutate(false, |state| {
            let gained = state.regenerate(now, interval);
            if gained > 0 {
                debug!(gained, current = state.current(), "Energy regenerated");
            }
            state.current()
        })
    }

    async fn consume(&self, amount: u32, reason: &str) -> OperationResult<EnergyRecord> {
        self.regenerate();
        let op = Consume {
            gateway: self.gateway.as_ref(),
            amount,
            reason,
            now: self.clock.now(),
        };
        execute(&self.store, &op).await
    }

    async fn purchase_refill(&self, price: CurrencyAmount) -> OperationResult<EnergyRecord> {
        self.regenerate();
        let op = Refill {
            gateway: self.gateway.as_ref(),
            price,
            now: self.clock.now(),
        };
        execute_dual(&self.store, self.ledger.as_ref(), &op).await
    }

    fn current(&self) -> u32 {
        self.store.read(EnergyState::current)
    }

    fn record(&self) -> EnergyRecord {
        self.store.snapshot()
    }

    async fn sync(&self) -> OperationResult<()> {
        synchronize(
            &self.store,
            "energy.sync",
            self.gateway.fetch_energy(),
            EnergyState::replace,
        )
        .await
        .map(|_| ())
    }

    fn reset(&self) {
        self.store.reset();
    }
}
