//! # Achievements Service

use crate::domain::{Achievement, AchievementBook, AchievementError, AchievementsState};
use crate::ports::{AchievementsApi, AchievementsGateway};
use async_trait::async_trait;
use shared_bus::EventPublisher;
use shared_optimistic::{execute, execute_dual, synchronize, DomainStore, DualOp, Ledger, OptimisticOp};
use shared_types::{GatewayError, LedgerEntry, OperationResult, RemoteReply};
use std::sync::Arc;
use tracing::{debug, info};

/// Achievements domain service.
///
/// Holds the currency ledger it credits rewards to; currency knows nothing
/// about achievements.
pub struct AchievementsService<G: AchievementsGateway, L: Ledger> {
    store: DomainStore<AchievementsState>,
    gateway: Arc<G>,
    ledger: Arc<L>,
}

impl<G: AchievementsGateway, L: Ledger> AchievementsService<G, L> {
    /// Create a service with no known achievements.
    pub fn new(gateway: Arc<G>, ledger: Arc<L>, bus: Arc<dyn EventPublisher>) -> Self {
        Self::with_book(gateway, ledger, bus, AchievementBook::new())
    }

    /// Create a service seeded with a catalog.
    pub fn with_book(
        gateway: Arc<G>,
        ledger: Arc<L>,
        bus: Arc<dyn EventPublisher>,
        book: AchievementBook,
    ) -> Self {
        Self {
            store: DomainStore::with_state(AchievementsState::from_book(book), bus),
            gateway,
            ledger,
        }
    }
}

struct ReportProgress<'a, G: AchievementsGateway> {
    gateway: &'a G,
    id: &'a str,
    value: u32,
}

#[async_trait]
impl<'a, G: AchievementsGateway> OptimisticOp<AchievementsState> for ReportProgress<'a, G> {
    type Output = Achievement;
    type Error = AchievementError;

    fn name(&self) -> &'static str {
        "achievements.progress"
    }

    fn validate(&self, state: &AchievementsState) -> Result<(), AchievementError> {
        state.check_progress(self.id, self.value).map(|_| ())
    }

    fn speculate(&self, state: &mut AchievementsState) -> Result<(), AchievementError> {
        state.advance(self.id, self.value)?;
        if state.get(self.id).is_some_and(|a| a.unlocked) {
            debug!(achievement = self.id, value = self.value, "Achievement unlocked locally");
        }
        Ok(())
    }

    async fn commit(&self) -> Result<RemoteReply<Achievement>, GatewayError> {
        self.gateway.report_progress(self.id, self.value).await
    }

    fn reconcile(&self, state: &mut AchievementsState, achievement: &Achievement) {
        state.set(self.id, *achievement);
    }
}

struct Claim<'a, G: AchievementsGateway> {
    gateway: &'a G,
    id: &'a str,
}

#[async_trait]
impl<'a, G: AchievementsGateway> DualOp<AchievementsState> for Claim<'a, G> {
    type Output = Achievement;
    type Error = AchievementError;

    fn name(&self) -> &'static str {
        "achievements.claim"
    }

    fn validate(
        &self,
        state: &AchievementsState,
    ) -> Result<Option<LedgerEntry>, AchievementError> {
        let reward = state.check_claim(self.id)?.reward;
        Ok((reward.amount > 0).then_some(LedgerEntry::Credit(reward)))
    }

    fn mark(&self, state: &mut AchievementsState) -> Result<(), AchievementError> {
        state.mark_claimed(self.id)
    }

    async fn confirm(&self) -> Result<RemoteReply<Achievement>, GatewayError> {
        self.gateway.claim_achievement(self.id).await
    }

    fn reconcile(&self, state: &mut AchievementsState, achievement: &Achievement) {
        state.set(self.id, *achievement);
    }
}

#[async_trait]
impl<G: AchievementsGateway, L: Ledger> AchievementsApi for AchievementsService<G, L> {
    async fn report_progress(&self, id: &str, value: u32) -> OperationResult<Achievement> {
        let op = ReportProgress {
            gateway: self.gateway.as_ref(),
            id,
            value,
        };
        execute(&self.store, &op).await
    }

    async fn claim(&self, id: &str) -> OperationResult<Achievement> {
        let op = Claim {
            gateway: self.gateway.as_ref(),
            id,
        };
        let result = execute_dual(&self.store, self.ledger.as_ref(), &op).await;
        if let OperationResult::Success(achievement) = &result {
            info!(achievement = id, reward = %achievement.reward, "Achievement reward claimed");
        }
        result
    }

    fn get(&self, id: &str) -> Option<Achievement> {
        self.store.read(|state| state.get(id).copied())
    }

    fn all(&self) -> AchievementBook {
        self.store.read(|state| state.book().clone())
    }

    async fn sync(&self) -> OperationResult<()> {
        synchronize(
            &self.store,
            "achievements.sync",
            self.gateway.fetch_achievements(),
            AchievementsState::replace,
        )
        .await
        .map(|_| ())
    }

    fn reset(&self) {
        self.store.reset();
    }
}
