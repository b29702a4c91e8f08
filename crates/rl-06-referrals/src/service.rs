//! # Referrals Service

use crate::domain::{Referee, ReferralError, ReferralRecord, ReferralState};
use crate::ports::{ReferralsApi, ReferralsGateway};
use async_trait::async_trait;
use shared_bus::EventPublisher;
use shared_optimistic::{execute, execute_dual, synchronize, DomainStore, DualOp, Ledger, OptimisticOp};
use shared_types::{GatewayError, LedgerEntry, OperationResult, RemoteReply};
use std::sync::Arc;
use tracing::info;

/// Referrals domain service.
pub struct ReferralsService<G: ReferralsGateway, L: Ledger> {
    store: DomainStore<ReferralState>,
    gateway: Arc<G>,
    ledger: Arc<L>,
}

impl<G: ReferralsGateway, L: Ledger> ReferralsService<G, L> {
    /// Create a service with an empty status.
    pub fn new(gateway: Arc<G>, ledger: Arc<L>, bus: Arc<dyn EventPublisher>) -> Self {
        Self::with_record(gateway, ledger, bus, ReferralRecord::default())
    }

    /// Create a service seeded with a known status.
    pub fn with_record(
        gateway: Arc<G>,
        ledger: Arc<L>,
        bus: Arc<dyn EventPublisher>,
        record: ReferralRecord,
    ) -> Self {
        Self {
            store: DomainStore::with_state(ReferralState::from_record(record), bus),
            gateway,
            ledger,
        }
    }
}

struct ApplyCode<'a, G: ReferralsGateway> {
    gateway: &'a G,
    code: &'a str,
}

#[async_trait]
impl<'a, G: ReferralsGateway> OptimisticOp<ReferralState> for ApplyCode<'a, G> {
    type Output = ReferralRecord;
    type Error = ReferralError;

    fn name(&self) -> &'static str {
        "referrals.apply_code"
    }

    fn validate(&self, state: &ReferralState) -> Result<(), ReferralError> {
        state.check_code(self.code)
    }

    fn speculate(&self, state: &mut ReferralState) -> Result<(), ReferralError> {
        state.apply_code(self.code)
    }

    async fn commit(&self) -> Result<RemoteReply<ReferralRecord>, GatewayError> {
        self.gateway.apply_referral_code(self.code).await
    }

    fn reconcile(&self, state: &mut ReferralState, record: &ReferralRecord) {
        state.replace(record.clone());
    }
}

struct ClaimReward<'a, G: ReferralsGateway> {
    gateway: &'a G,
    referee: &'a str,
}

#[async_trait]
impl<'a, G: ReferralsGateway> DualOp<ReferralState> for ClaimReward<'a, G> {
    type Output = Referee;
    type Error = ReferralError;

    fn name(&self) -> &'static str {
        "referrals.claim"
    }

    fn validate(&self, state: &ReferralState) -> Result<Option<LedgerEntry>, ReferralError> {
        let reward = state.check_claim(self.referee)?.reward;
        Ok((reward.amount > 0).then_some(LedgerEntry::Credit(reward)))
    }

    fn mark(&self, state: &mut ReferralState) -> Result<(), ReferralError> {
        state.mark_claimed(self.referee)
    }

    async fn confirm(&self) -> Result<RemoteReply<Referee>, GatewayError> {
        self.gateway.claim_referral_reward(self.referee).await
    }

    fn reconcile(&self, state: &mut ReferralState, referee: &Referee) {
        state.set_referee(self.referee, *referee);
    }
}

#[async_trait]
impl<G: ReferralsGateway, L: Ledger> ReferralsApi for ReferralsService<G, L> {
    async fn apply_code(&self, code: &str) -> OperationResult<ReferralRecord> {
        let op = ApplyCode {
            gateway: self.gateway.as_ref(),
            code,
        };
        let result = execute(&self.store, &op).await;
        if result.is_success() {
            info!(code, "Referral code applied");
        }
        result
    }

    async fn claim_reward(&self, referee: &str) -> OperationResult<Referee> {
        let op = ClaimReward {
            gateway: self.gateway.as_ref(),
            referee,
        };
        execute_dual(&self.store, self.ledger.as_ref(), &op).await
    }

    fn status(&self) -> ReferralRecord {
        self.store.snapshot()
    }

    async fn sync(&self) -> OperationResult<()> {
        synchronize(
            &self.store,
            "referrals.sync",
            self.gateway.fetch_referrals(),
            ReferralState::replace,
        )
        .await
        .map(|_| ())
    }

    fn reset(&self) {
        self.store.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::mock::{MockReferralsGateway, Scripted};
    use shared_bus::{ClientEvent, EventFilter, InMemoryEventBus};
    use shared_optimistic::InMemoryLedger;
    use shared_types::{CurrencyAmount, CurrencyType, RollbackCategory};
    use std::collections::BTreeMap;

    fn record() -> ReferralRecord {
        ReferralRecord {
            own_code: Some("RUNNER42".into()),
            referred_by: None,
            referees: BTreeMap::from([
                (
                    "friend-1".to_string(),
                    Referee {
                        reward: CurrencyAmount::hard(10),
                        claimed: false,
                    },
                ),
                (
                    "friend-2".to_string(),
                    Referee {
                        reward: CurrencyAmount::soft(0),
                        claimed: false,
                    },
                ),
            ]),
        }
    }

    struct Fixture {
        bus: Arc<InMemoryEventBus>,
        gateway: Arc<MockReferralsGateway>,
        ledger: Arc<InMemoryLedger>,
        service: ReferralsService<MockReferralsGateway, InMemoryLedger>,
    }

    fn fixture() -> Fixture {
        let bus = Arc::new(InMemoryEventBus::new());
        let gateway = Arc::new(MockReferralsGateway::with_record(record(), &["SPEEDY7"]));
        let ledger = Arc::new(InMemoryLedger::default());
        let service =
            ReferralsService::with_record(gateway.clone(), ledger.clone(), bus.clone(), record());
        Fixture {
            bus,
            gateway,
            ledger,
            service,
        }
    }

    #[tokio::test]
    async fn test_apply_code_confirmed() {
        let f = fixture();
        let mut sub = f.bus.subscribe(EventFilter::all());

        let result = f.service.apply_code("SPEEDY7").await;

        assert!(result.is_success());
        assert_eq!(f.service.status().referred_by.as_deref(), Some("SPEEDY7"));
        assert_eq!(
            sub.drain()[0],
            ClientEvent::ReferralChanged {
                previous: None,
                current: Some("SPEEDY7".into()),
                is_optimistic: true,
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_code_rolls_back() {
        let f = fixture();
        let mut sub = f.bus.subscribe(EventFilter::rollbacks());

        let result = f.service.apply_code("NOBODY11").await;

        assert!(matches!(
            result,
            OperationResult::RolledBack {
                category: RollbackCategory::BusinessRule,
                ..
            }
        ));
        assert_eq!(f.service.status().referred_by, None);
        assert_eq!(sub.drain().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_code_never_reaches_server() {
        let f = fixture();
        assert_eq!(
            f.service.apply_code("AB").await,
            OperationResult::ValidationError(ReferralError::InvalidLength(2).to_string())
        );
        assert_eq!(
            f.service.apply_code("runner42").await,
            OperationResult::ValidationError(ReferralError::OwnCode.to_string())
        );
        assert!(f.gateway.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_code_applies_once() {
        let f = fixture();
        assert!(f.service.apply_code("SPEEDY7").await.is_success());
        assert!(matches!(
            f.service.apply_code("SPEEDY7").await,
            OperationResult::ValidationError(_)
        ));
    }

    #[tokio::test]
    async fn test_claim_credits_ledger() {
        let f = fixture();

        let result = f.service.claim_reward("friend-1").await;

        assert!(result.is_success());
        assert!(f.service.status().referees["friend-1"].claimed);
        assert_eq!(f.ledger.balance(CurrencyType::HardCurrency), 10);
    }

    #[tokio::test]
    async fn test_zero_reward_claim_skips_ledger() {
        let f = fixture();
        assert!(f.service.claim_reward("friend-2").await.is_success());
        assert!(f.ledger.applied().is_empty());
    }

    #[tokio::test]
    async fn test_claim_network_failure_reverts_both() {
        let f = fixture();
        f.gateway.push(Scripted::Fail(GatewayError::Timeout));

        let result = f.service.claim_reward("friend-1").await;

        assert!(result.is_retryable());
        assert!(!f.service.status().referees["friend-1"].claimed);
        assert_eq!(f.ledger.balance(CurrencyType::HardCurrency), 0);
    }

    #[tokio::test]
    async fn test_claim_rejected_reverts_both() {
        let f = fixture();
        f.gateway.push(Scripted::Reject("referee not verified".into()));

        let result = f.service.claim_reward("friend-1").await;

        assert!(matches!(result, OperationResult::RolledBack { .. }));
        assert!(!f.service.status().referees["friend-1"].claimed);
        assert_eq!(f.ledger.balance(CurrencyType::HardCurrency), 0);
    }

    #[tokio::test]
    async fn test_sync_and_reset() {
        let f = fixture();
        f.gateway.server.lock().referred_by = Some("SPEEDY7".into());

        assert!(f.service.sync().await.is_success());
        assert_eq!(f.service.status().referred_by.as_deref(), Some("SPEEDY7"));

        f.service.reset();
        assert_eq!(f.service.status(), ReferralRecord::default());
    }
}
