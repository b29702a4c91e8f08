//! # Outbound Ports

use crate::domain::EnergyRecord;
use async_trait::async_trait;
use shared_types::{CurrencyAmount, GatewayError, RemoteReply};

/// Server gateway for the energy domain.
#[async_trait]
pub trait EnergyGateway: Send + Sync {
    /// Spend energy on the server.
    async fn consume_energy(
        &self,
        amount: u32,
        reason: &str,
    ) -> Result<RemoteReply<EnergyRecord>, GatewayError>;

    /// Confirm a paid refill.
    async fn refill_energy(
        &self,
        price: CurrencyAmount,
    ) -> Result<RemoteReply<EnergyRecord>, GatewayError>;

    /// Fetch the counters.
    async fn fetch_energy(&self) -> Result<EnergyRecord, GatewayError>;
}
