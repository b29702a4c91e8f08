//! # Tasks Service
//!
//! Progress increments are applied locally at once and sent in summed
//! batches by a [`BatchAccumulator`]. Claims flush first so the server has
//! seen every increment, then credit the reward through the [`Ledger`].

use crate::config::TaskConfig;
use crate::domain::{Task, TaskBook, TaskError, TasksSnapshot, TasksState};
use crate::ports::{TasksApi, TasksGateway};
use async_trait::async_trait;
use shared_bus::{ClientEvent, EventPublisher};
use shared_optimistic::{
    execute_dual, BatchAccumulator, BatchHandler, DomainStore, DualOp, FlushOutcome, Ledger,
};
use shared_types::{Domain, GatewayError, LedgerEntry, OperationResult, RemoteReply, RollbackEvent};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Batch side of the tasks domain.
pub struct ProgressBatch<G: TasksGateway> {
    store: Arc<DomainStore<TasksState>>,
    gateway: Arc<G>,
}

#[async_trait]
impl<G: TasksGateway> BatchHandler for ProgressBatch<G> {
    type Key = String;
    type Ack = TaskBook;

    fn domain(&self) -> Domain {
        Domain::Tasks
    }

    fn name(&self) -> &'static str {
        "tasks.flush"
    }

    async fn send(
        &self,
        batch: &BTreeMap<String, u64>,
    ) -> Result<RemoteReply<TaskBook>, GatewayError> {
        self.gateway.update_progress(batch).await
    }

    fn apply_ack(&self, records: TaskBook, still_pending: &BTreeMap<String, u64>) {
        self.store
            .mutate(false, |state| state.acknowledge(records, still_pending));
        self.store.publish(ClientEvent::SyncCompleted {
            domain: Domain::Tasks,
            operation: self.name().to_string(),
        });
    }

    fn revert(&self, batch: &BTreeMap<String, u64>, rollback: RollbackEvent) {
        self.store.correct(rollback, |state| state.retract(batch));
    }
}

/// Tasks domain service.
pub struct TasksService<G: TasksGateway, L: Ledger> {
    store: Arc<DomainStore<TasksState>>,
    accumulator: Arc<BatchAccumulator<ProgressBatch<G>>>,
    gateway: Arc<G>,
    ledger: Arc<L>,
}

impl<G: TasksGateway, L: Ledger> TasksService<G, L> {
    /// Create a service with no known tasks.
    pub fn new(
        config: &TaskConfig,
        gateway: Arc<G>,
        ledger: Arc<L>,
        bus: Arc<dyn EventPublisher>,
    ) -> Self {
        Self::with_book(config, gateway, ledger, bus, TaskBook::new())
    }

    /// Create a service seeded with a task list.
    pub fn with_book(
        config: &TaskConfig,
        gateway: Arc<G>,
        ledger: Arc<L>,
        bus: Arc<dyn EventPublisher>,
        book: TaskBook,
    ) -> Self {
        let store = Arc::new(DomainStore::with_state(TasksState::from_book(book), bus));
        let accumulator = BatchAccumulator::new(
            ProgressBatch {
                store: store.clone(),
                gateway: gateway.clone(),
            },
            config.flush_interval(),
        );
        Self {
            store,
            accumulator,
            gateway,
            ledger,
        }
    }

    /// Whether the flush timer is scheduled.
    pub fn is_timer_running(&self) -> bool {
        self.accumulator.is_timer_running()
    }
}

struct ClaimTask<'a, G: TasksGateway> {
    gateway: &'a G,
    id: &'a str,
}

#[async_trait]
impl<'a, G: TasksGateway> DualOp<TasksState> for ClaimTask<'a, G> {
    type Output = Task;
    type Error = TaskError;

    fn name(&self) -> &'static str {
        "tasks.claim"
    }

    fn validate(&self, state: &TasksState) -> Result<Option<LedgerEntry>, TaskError> {
        let reward = state.check_claim(self.id)?.reward;
        Ok((reward.amount > 0).then_some(LedgerEntry::Credit(reward)))
    }

    fn mark(&self, state: &mut TasksState) -> Result<(), TaskError> {
        state.mark_claimed(self.id)
    }

    async fn confirm(&self) -> Result<RemoteReply<Task>, GatewayError> {
        self.gateway.claim_task(self.id).await
    }

    fn reconcile(&self, state: &mut TasksState, task: &Task) {
        state.set(self.id, *task);
    }

    // Increments skip the single-flight permit, so other tasks may have
    // moved since the snapshot.
    fn unmark(&self, state: &mut TasksState, before: TasksSnapshot) {
        state.restore_task(self.id, &before);
    }
}

// A requeued or refused flush means the server has not seen the progress.
fn flush_failure<T>(outcome: &FlushOutcome) -> Option<OperationResult<T>> {
    match outcome {
        FlushOutcome::Requeued { cause } => Some(OperationResult::NetworkError {
            cause: cause.clone(),
            retryable: true,
        }),
        FlushOutcome::Rejected { reason, category } => Some(OperationResult::RolledBack {
            reason: reason.clone(),
            category: *category,
        }),
        FlushOutcome::Empty
        | FlushOutcome::Skipped
        | FlushOutcome::Accepted { .. }
        | FlushOutcome::Discarded => None,
    }
}

#[async_trait]
impl<G: TasksGateway, L: Ledger> TasksApi for TasksService<G, L> {
    fn increment(&self, id: &str, delta: u32) -> Result<u32, TaskError> {
        let mut progress = 0;
        self.accumulator.enqueue(id.to_string(), u64::from(delta), || {
            progress = self
                .store
                .try_mutate(true, |state| state.increment(id, delta))?;
            Ok::<(), TaskError>(())
        })?;
        debug!(task = id, delta, progress, "Progress queued");
        Ok(progress)
    }

    async fn flush(&self) -> FlushOutcome {
        self.accumulator.flush().await
    }

    async fn claim(&self, id: &str) -> OperationResult<Task> {
        let (outcome, _hold) = self.accumulator.flush_and_hold().await;
        if let Some(failure) = flush_failure(&outcome) {
            warn!(task = id, outcome = ?outcome, "Pre-claim flush failed");
            return failure;
        }
        let op = ClaimTask {
            gateway: self.gateway.as_ref(),
            id,
        };
        execute_dual(self.store.as_ref(), self.ledger.as_ref(), &op).await
    }

    fn get(&self, id: &str) -> Option<Task> {
        self.store.read(|state| state.get(id).copied())
    }

    fn all(&self) -> TaskBook {
        self.store.read(|state| state.book().clone())
    }

    fn pending_deltas(&self) -> BTreeMap<String, u64> {
        self.accumulator.pending()
    }

    async fn sync(&self) -> OperationResult<()> {
        let (outcome, _hold) = self.accumulator.flush_and_hold().await;
        if let Some(failure) = flush_failure(&outcome) {
            return failure;
        }
        self.accumulator
            .synchronize(
                self.store.as_ref(),
                "tasks.sync",
                self.gateway.fetch_tasks(),
                TasksState::resync,
            )
            .await
            .map(|_| ())
    }

    fn reset(&self) {
        self.accumulator.clear();
        self.store.reset();
    }
}
