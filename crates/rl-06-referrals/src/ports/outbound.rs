//! # Outbound Ports

use crate::domain::{Referee, ReferralRecord};
use async_trait::async_trait;
use shared_types::{GatewayError, RemoteReply};

/// Server gateway for the referrals domain.
#[async_trait]
pub trait ReferralsGateway: Send + Sync {
    /// Register the referrer code. Replies with the full status.
    async fn apply_referral_code(
        &self,
        code: &str,
    ) -> Result<RemoteReply<ReferralRecord>, GatewayError>;

    /// Confirm a referral reward claim.
    async fn claim_referral_reward(
        &self,
        referee: &str,
    ) -> Result<RemoteReply<Referee>, GatewayError>;

    /// Fetch the full status.
    async fn fetch_referrals(&self) -> Result<ReferralRecord, GatewayError>;
}
