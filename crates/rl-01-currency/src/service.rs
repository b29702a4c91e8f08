//! # Currency Service
//!
//! Optimistic add/spend over the balance store. Also the [`Ledger`] that
//! claim and purchase operations in other domains move currency through.

use crate::domain::{BalanceReceipt, BalanceSheet, CurrencyError, CurrencyState};
use crate::ports::{CurrencyApi, CurrencyGateway};
use async_trait::async_trait;
use shared_bus::EventPublisher;
use shared_optimistic::{execute, synchronize, DomainStore, Ledger, OptimisticOp};
use shared_types::{
    CurrencyAmount, CurrencyType, GatewayError, LedgerEntry, OperationResult, RemoteReply,
};
use std::sync::Arc;
use tracing::debug;

/// Currency domain service.
pub struct CurrencyService<G: CurrencyGateway> {
    store: DomainStore<CurrencyState>,
    gateway: Arc<G>,
}

impl<G: CurrencyGateway> CurrencyService<G> {
    /// Create a service with zero balances.
    pub fn new(gateway: Arc<G>, bus: Arc<dyn EventPublisher>) -> Self {
        Self {
            store: DomainStore::new(bus),
            gateway,
        }
    }

    /// Create a service with known starting balances.
    pub fn with_balances(
        gateway: Arc<G>,
        bus: Arc<dyn EventPublisher>,
        balances: BalanceSheet,
    ) -> Self {
        Self {
            store: DomainStore::with_state(CurrencyState::from_balances(balances), bus),
            gateway,
        }
    }

    /// Whether an add or spend is in flight.
    pub fn is_pending(&self) -> bool {
        self.store.is_pending()
    }

    async fn change(&self, entry: LedgerEntry, reason: &str) -> OperationResult<u64> {
        let op = BalanceChange {
            gateway: self.gateway.as_ref(),
            entry,
            reason,
        };
        execute(&self.store, &op)
            .await
            .map(|receipt| receipt.balance)
    }
}

/// One credit or debit.
struct BalanceChange<'a, G: CurrencyGateway> {
    gateway: &'a G,
    entry: LedgerEntry,
    reason: &'a str,
}

#[async_trait]
impl<'a, G: CurrencyGateway> OptimisticOp<CurrencyState> for BalanceChange<'a, G> {
    type Output = BalanceReceipt;
    type Error = CurrencyError;

    fn name(&self) -> &'static str {
        match self.entry {
            LedgerEntry::Credit(_) => "currency.add",
            LedgerEntry::Debit(_) => "currency.spend",
        }
    }

    fn validate(&self, state: &CurrencyState) -> Result<(), CurrencyError> {
        state.check(&self.entry).map(|_| ())
    }

    fn speculate(&self, state: &mut CurrencyState) -> Result<(), CurrencyError> {
        let balance = state.apply(&self.entry)?;
        debug!(balance, reason = self.reason, "Speculative balance");
        Ok(())
    }

    async fn commit(&self) -> Result<RemoteReply<BalanceReceipt>, GatewayError> {
        let CurrencyAmount { currency, amount } = self.entry.amount();
        match self.entry {
            LedgerEntry::Credit(_) => self.gateway.add_currency(currency, amount, self.reason).await,
            LedgerEntry::Debit(_) => {
                self.gateway
                    .spend_currency(currency, amount, self.reason)
                    .await
            }
        }
    }

    fn reconcile(&self, state: &mut CurrencyState, receipt: &BalanceReceipt) {
        state.set_balance(receipt.currency, receipt.balance);
    }
}

#[async_trait]
impl<G: CurrencyGateway> CurrencyApi for CurrencyService<G> {
    async fn add(&self, currency: CurrencyType, amount: u64, reason: &str) -> OperationResult<u64> {
        self.change(LedgerEntry::Credit(CurrencyAmount::new(currency, amount)), reason)
            .await
    }

    async fn spend(
        &self,
        currency: CurrencyType,
        amount: u64,
        reason: &str,
    ) -> OperationResult<u64> {
        self.change(LedgerEntry::Debit(CurrencyAmount::new(currency, amount)), reason)
            .await
    }

    fn balance(&self, currency: CurrencyType) -> u64 {
        self.store.read(|state| state.balance(currency))
    }

    fn balances(&self) -> BalanceSheet {
        self.store.read(|state| state.balances().clone())
    }

    async fn sync(&self) -> OperationResult<()> {
        synchronize(
            &self.store,
            "currency.sync",
            self.gateway.fetch_balances(),
            CurrencyState::replace,
        )
        .await
        .map(|_| ())
    }

    fn reset(&self) {
        self.store.reset();
    }
}

#[async_trait]
impl<G: CurrencyGateway> Ledger for CurrencyService<G> {
    /// Store generation; a revert after sign-out is dropped.
    type Checkpoint = u64;

    fn checkpoint(&self) -> u64 {
        self.store.generation()
    }

    async fn apply(&self, entry: &LedgerEntry, reason: &str) -> OperationResult<u64> {
        self.change(*entry, reason).await
    }

    fn revert(&self, generation: u64, entry: &LedgerEntry) {
        let reverted = self
            .store
            .mutate_current(generation, false, |state| state.revert(entry));
        if let Some(balance) = reverted {
            debug!(balance, currency = %entry.amount().currency, "Ledger entry reverted");
        }
    }
}
