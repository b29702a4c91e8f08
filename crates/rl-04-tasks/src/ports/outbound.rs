//! # Outbound Ports

use crate::domain::{Task, TaskBook};
use async_trait::async_trait;
use shared_types::{GatewayError, RemoteReply};
use std::collections::BTreeMap;

/// Server gateway for the tasks domain.
#[async_trait]
pub trait TasksGateway: Send + Sync + 'static {
    /// Apply summed progress deltas. Replies with the server's record of
    /// every task in the batch.
    async fn update_progress(
        &self,
        deltas: &BTreeMap<String, u64>,
    ) -> Result<RemoteReply<TaskBook>, GatewayError>;

    /// Confirm a reward claim.
    async fn claim_task(&self, id: &str) -> Result<RemoteReply<Task>, GatewayError>;

    /// Fetch every task.
    async fn fetch_tasks(&self) -> Result<TaskBook, GatewayError>;
}
