//! # Inbound Ports
//!
//! What the currency domain offers the rest of the client.

use crate::domain::BalanceSheet;
use async_trait::async_trait;
use shared_types::{CurrencyType, OperationResult};

/// Currency API - inbound port.
#[async_trait]
pub trait CurrencyApi: Send + Sync {
    /// Credit a balance optimistically. Returns the authoritative balance.
    async fn add(&self, currency: CurrencyType, amount: u64, reason: &str)
        -> OperationResult<u64>;

    /// Debit a balance optimistically. Returns the authoritative balance.
    async fn spend(
        &self,
        currency: CurrencyType,
        amount: u64,
        reason: &str,
    ) -> OperationResult<u64>;

    /// Current local balance.
    fn balance(&self, currency: CurrencyType) -> u64;

    /// Every local balance.
    fn balances(&self) -> BalanceSheet;

    /// Overwrite local balances with the server's.
    async fn sync(&self) -> OperationResult<()>;

    /// Drop all local state (sign-out).
    fn reset(&self);
}
