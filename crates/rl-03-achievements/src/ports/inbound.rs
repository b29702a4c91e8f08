//! # Inbound Ports

use crate::domain::{Achievement, AchievementBook};
use async_trait::async_trait;
use shared_types::OperationResult;

/// Achievements API - inbound port.
#[async_trait]
pub trait AchievementsApi: Send + Sync {
    /// Report absolute progress. Lower or equal values are rejected.
    async fn report_progress(&self, id: &str, value: u32) -> OperationResult<Achievement>;

    /// Claim the reward of an unlocked achievement, crediting the ledger.
    async fn claim(&self, id: &str) -> OperationResult<Achievement>;

    /// One achievement as known locally.
    fn get(&self, id: &str) -> Option<Achievement>;

    /// Every achievement as known locally.
    fn all(&self) -> AchievementBook;

    /// Overwrite local achievements with the server's.
    async fn sync(&self) -> OperationResult<()>;

    /// Drop all local state (sign-out).
    fn reset(&self);
}
