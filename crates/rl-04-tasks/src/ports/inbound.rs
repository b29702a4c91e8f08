//! # Inbound Ports

use crate::domain::{Task, TaskBook, TaskError};
use async_trait::async_trait;
use shared_optimistic::FlushOutcome;
use shared_types::OperationResult;
use std::collections::BTreeMap;

/// Tasks API - inbound port.
#[async_trait]
pub trait TasksApi: Send + Sync {
    /// Add progress locally and queue it for the next batch. Returns the new
    /// local progress.
    fn increment(&self, id: &str, delta: u32) -> Result<u32, TaskError>;

    /// Send pending deltas now.
    async fn flush(&self) -> FlushOutcome;

    /// Flush, then claim the reward of a completed task.
    async fn claim(&self, id: &str) -> OperationResult<Task>;

    /// One task as known locally.
    fn get(&self, id: &str) -> Option<Task>;

    /// Every task as known locally.
    fn all(&self) -> TaskBook;

    /// Deltas not yet acknowledged by the server.
    fn pending_deltas(&self) -> BTreeMap<String, u64>;

    /// Flush, then overwrite local tasks with the server's.
    async fn sync(&self) -> OperationResult<()>;

    /// Stop the flush timer, drop pending deltas and all local state.
    fn reset(&self);
}
