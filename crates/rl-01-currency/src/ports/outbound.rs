//! # Outbound Ports
//!
//! The remote authority for balances.

use crate::domain::{BalanceReceipt, BalanceSheet};
use async_trait::async_trait;
use shared_types::{CurrencyType, GatewayError, RemoteReply};

/// Server gateway for the currency domain.
#[async_trait]
pub trait CurrencyGateway: Send + Sync {
    /// Credit `amount` on the server.
    async fn add_currency(
        &self,
        currency: CurrencyType,
        amount: u64,
        reason: &str,
    ) -> Result<RemoteReply<BalanceReceipt>, GatewayError>;

    /// Debit `amount` on the server.
    async fn spend_currency(
        &self,
        currency: CurrencyType,
        amount: u64,
        reason: &str,
    ) -> Result<RemoteReply<BalanceReceipt>, GatewayError>;

    /// Fetch every balance.
    async fn fetch_balances(&self) -> Result<BalanceSheet, GatewayError>;
}
