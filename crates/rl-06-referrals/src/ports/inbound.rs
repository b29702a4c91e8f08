//! # Inbound Ports

use crate::domain::{Referee, ReferralRecord};
use async_trait::async_trait;
use shared_types::OperationResult;

/// Referrals API - inbound port.
#[async_trait]
pub trait ReferralsApi: Send + Sync {
    /// Record the code this player was referred by. Allowed once.
    async fn apply_code(&self, code: &str) -> OperationResult<ReferralRecord>;

    /// Claim the reward for a referred player, crediting the ledger.
    async fn claim_reward(&self, referee: &str) -> OperationResult<Referee>;

    /// Local referral status.
    fn status(&self) -> ReferralRecord;

    /// Overwrite local status with the server's.
    async fn sync(&self) -> OperationResult<()>;

    /// Drop all local state (sign-out).
    fn reset(&self);
}
