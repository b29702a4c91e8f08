//! # Inbound Ports

use crate::domain::EnergyRecord;
use async_trait::async_trait;
use shared_types::{CurrencyAmount, OperationResult};

/// Energy API - inbound port.
#[async_trait]
pub trait EnergyApi: Send + Sync {
    /// Credit regeneration due by now. Returns current energy.
    fn regenerate(&self) -> u32;

    /// Regenerate, then spend `amount` optimistically.
    async fn consume(&self, amount: u32, reason: &str) -> OperationResult<EnergyRecord>;

    /// Fill to the cap, debiting `price` from the ledger.
    async fn purchase_refill(&self, price: CurrencyAmount) -> OperationResult<EnergyRecord>;

    /// Current local energy, without regenerating.
    fn current(&self) -> u32;

    /// Local counters.
    fn record(&self) -> EnergyRecord;

    /// Overwrite local counters with the server's.
    async fn sync(&self) -> OperationResult<()>;

    /// Drop all local state (sign-out).
    fn reset(&self);
}
