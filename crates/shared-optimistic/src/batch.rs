//! # Batched Mutation Accumulator
//!
//! High-frequency increments are applied locally at once and summed into a
//! pending-delta map. A recurring timer sends the map as one batch.
//!
//! ## Timer
//!
//! Started lazily by the first delta, it fires every `interval` while deltas
//! remain and retires itself once the map is empty. Each timer owns a
//! `CancellationToken`; restarting the timer cancels the old token.
//!
//! ## Single flight
//!
//! Only one flush is outstanding at a time. A timer tick that finds a flush
//! running skips; an explicit [`BatchAccumulator::flush`] waits for it.
//!
//! Lock order is accumulator, then domain store.

use crate::coordinator::{panic_message, synchronize_with};
use crate::state::DomainState;
use crate::store::DomainStore;
use async_trait::async_trait;
use client_telemetry::{record_batch_flush, record_rollback};
use futures::FutureExt;
use parking_lot::Mutex;
use shared_types::{
    Domain, GatewayError, OperationResult, RemoteReply, RollbackCategory, RollbackEvent,
};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Domain side of a batched accumulator.
#[async_trait]
pub trait BatchHandler: Send + Sync + 'static {
    /// Item identifier.
    type Key: Ord + Clone + Debug + Send + Sync + 'static;
    /// Server acknowledgement of an accepted batch.
    type Ack: Send + 'static;

    /// Domain the deltas belong to.
    fn domain(&self) -> Domain;

    /// Operation name for logs and rollback events.
    fn name(&self) -> &'static str;

    /// Send one batch to the server.
    async fn send(
        &self,
        batch: &BTreeMap<Self::Key, u64>,
    ) -> Result<RemoteReply<Self::Ack>, GatewayError>;

    /// Overwrite local values with the server's. `still_pending` holds deltas
    /// accumulated while the batch was in flight; they must stay applied.
    fn apply_ack(&self, ack: Self::Ack, still_pending: &BTreeMap<Self::Key, u64>);

    /// Subtract a refused batch from local values (floor at zero), then
    /// publish `rollback`.
    fn revert(&self, batch: &BTreeMap<Self::Key, u64>, rollback: RollbackEvent);
}

/// What one flush attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was pending.
    Empty,
    /// Another flush was in progress (timer ticks only).
    Skipped,
    /// The server accepted the batch.
    Accepted {
        /// Number of items in the batch.
        items: usize,
    },
    /// The server refused the batch; deltas were reverted locally.
    Rejected {
        /// Server reason.
        reason: String,
        /// Rollback category emitted.
        category: RollbackCategory,
    },
    /// Transport failed; deltas went back into the pending map.
    Requeued {
        /// Transport failure description.
        cause: String,
    },
    /// The accumulator was cleared while the batch was in flight.
    Discarded,
}

impl FlushOutcome {
    fn label(&self) -> &'static str {
        match self {
            FlushOutcome::Empty => "empty",
            FlushOutcome::Skipped => "skipped",
            FlushOutcome::Accepted { .. } => "accepted",
            FlushOutcome::Rejected { .. } => "rejected",
            FlushOutcome::Requeued { .. } => "requeued",
            FlushOutcome::Discarded => "discarded",
        }
    }
}

/// Exclusive hold on an accumulator's flush slot.
pub struct FlushHold<'a> {
    _guard: tokio::sync::MutexGuard<'a, ()>,
}

struct Timer {
    id: u64,
    token: CancellationToken,
}

struct Pending<K> {
    deltas: BTreeMap<K, u64>,
    timer: Option<Timer>,
    next_timer_id: u64,
    epoch: u64,
}

/// Accumulates deltas and flushes them in batches.
pub struct BatchAccumulator<H: BatchHandler> {
    handler: H,
    interval: Duration,
    pending: Mutex<Pending<H::Key>>,
    flush_lock: tokio::sync::Mutex<()>,
    this: Weak<Self>,
}

impl<H: BatchHandler> BatchAccumulator<H> {
    /// Create an accumulator flushing every `interval`.
    pub fn new(handler: H, interval: Duration) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            handler,
            interval,
            pending: Mutex::new(Pending {
                deltas: BTreeMap::new(),
                timer: None,
                next_timer_id: 0,
                epoch: 0,
            }),
            flush_lock: tokio::sync::Mutex::new(()),
            this: this.clone(),
        })
    }

    /// The domain handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Flush interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Apply a delta locally through `apply` and queue it for the next flush.
    ///
    /// Nothing is queued if `apply` fails.
    pub fn enqueue<E>(
        &self,
        key: H::Key,
        delta: u64,
        apply: impl FnOnce() -> Result<(), E>,
    ) -> Result<(), E> {
        let mut pending = self.pending.lock();
        apply()?;
        let slot = pending.deltas.entry(key).or_insert(0);
        *slot = slot.saturating_add(delta);
        if pending.timer.is_none() {
            self.start_timer(&mut pending);
        }
        Ok(())
    }

    /// Copy of the pending-delta map.
    pub fn pending(&self) -> BTreeMap<H::Key, u64> {
        self.pending.lock().deltas.clone()
    }

    /// Pending delta for one item.
    pub fn pending_for(&self, key: &H::Key) -> u64 {
        self.pending.lock().deltas.get(key).copied().unwrap_or(0)
    }

    /// Whether a flush timer is scheduled.
    pub fn is_timer_running(&self) -> bool {
        self.pending.lock().timer.is_some()
    }

    /// Overwrite `store` with a full authoritative fetch, then lay the deltas
    /// the server has not seen back on top through `apply`.
    ///
    /// Runs under the pending lock, so an increment cannot land between the
    /// overwrite and the re-application.
    pub async fn synchronize<S, T, Fut>(
        &self,
        store: &DomainStore<S>,
        operation: &'static str,
        fetch: Fut,
        apply: impl FnOnce(&mut S, T, &BTreeMap<H::Key, u64>),
    ) -> OperationResult<S::Snapshot>
    where
        S: DomainState,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        synchronize_with(store, operation, fetch, |generation, authoritative| {
            let pending = self.pending.lock();
            store.mutate_current(generation, false, |state| {
                apply(state, authoritative, &pending.deltas);
                state.snapshot()
            })
        })
        .await
    }

    /// Flush now, waiting for any flush already in progress.
    pub async fn flush(&self) -> FlushOutcome {
        let (outcome, _hold) = self.flush_and_hold().await;
        outcome
    }

    /// Flush now, then keep every other flush out until the returned
    /// [`FlushHold`] is dropped. Timer ticks skip while it is held.
    pub async fn flush_and_hold(&self) -> (FlushOutcome, FlushHold<'_>) {
        let guard = self.flush_lock.lock().await;
        let outcome = self.flush_exclusive().await;
        (outcome, FlushHold { _guard: guard })
    }

    /// Stop the timer. Pending deltas stay queued.
    pub fn stop(&self) {
        let mut pending = self.pending.lock();
        if let Some(timer) = pending.timer.take() {
            timer.token.cancel();
        }
    }

    /// Stop the timer and drop every pending delta. A flush in flight will
    /// discard its reply.
    pub fn clear(&self) {
        let mut pending = self.pending.lock();
        if let Some(timer) = pending.timer.take() {
            timer.token.cancel();
        }
        pending.deltas.clear();
        pending.epoch += 1;
    }

    async fn flush_on_tick(&self) -> FlushOutcome {
        let Ok(_flushing) = self.flush_lock.try_lock() else {
            debug!(domain = %self.handler.domain(), "Flush in progress, tick skipped");
            return FlushOutcome::Skipped;
        };
        self.flush_exclusive().await
    }

    async fn flush_exclusive(&self) -> FlushOutcome {
        let (batch, epoch) = {
            let mut pending = self.pending.lock();
            (std::mem::take(&mut pending.deltas), pending.epoch)
        };
        if batch.is_empty() {
            return FlushOutcome::Empty;
        }

        let domain = self.handler.domain();
        let items = batch.len();
        debug!(domain = %domain, items, "Flushing batch");

        let reply = AssertUnwindSafe(self.handler.send(&batch))
            .catch_unwind()
            .await;

        let mut pending = self.pending.lock();
        if pending.epoch != epoch {
            debug!(domain = %domain, "Accumulator cleared during flush; reply discarded");
            return FlushOutcome::Discarded;
        }

        let outcome = match reply {
            Ok(Ok(RemoteReply::Accepted(ack))) => {
                self.handler.apply_ack(ack, &pending.deltas);
                info!(domain = %domain, items, "Batch accepted");
                FlushOutcome::Accepted { items }
            }
            Ok(Ok(RemoteReply::Rejected(reason))) => {
                self.reject(&batch, reason, RollbackCategory::BusinessRule)
            }
            Ok(Ok(RemoteReply::Conflict(reason))) => {
                self.reject(&batch, reason, RollbackCategory::StateConflict)
            }
            Ok(Err(error)) => {
                for (key, delta) in batch {
                    let slot = pending.deltas.entry(key).or_insert(0);
                    *slot = slot.saturating_add(delta);
                }
                self.restart_timer(&mut pending);
                warn!(domain = %domain, error = %error, "Batch transport failed; requeued");
                FlushOutcome::Requeued {
                    cause: error.to_string(),
                }
            }
            Err(payload) => self.reject(
                &batch,
                panic_message(payload.as_ref()),
                RollbackCategory::Critical,
            ),
        };
        drop(pending);

        record_batch_flush(domain.as_str(), outcome.label());
        outcome
    }

    fn reject(
        &self,
        batch: &BTreeMap<H::Key, u64>,
        reason: String,
        category: RollbackCategory,
    ) -> FlushOutcome {
        let domain = self.handler.domain();
        let rollback = RollbackEvent::new(
            Uuid::new_v4(),
            domain,
            self.handler.name(),
            reason.clone(),
            category,
        );
        self.handler.revert(batch, rollback);
        record_rollback(domain.as_str(), category.as_str());
        warn!(domain = %domain, category = %category, reason = %reason, "Batch refused; deltas reverted");
        FlushOutcome::Rejected { reason, category }
    }

    fn restart_timer(&self, pending: &mut Pending<H::Key>) {
        if let Some(timer) = pending.timer.take() {
            timer.token.cancel();
        }
        self.start_timer(pending);
    }

    fn start_timer(&self, pending: &mut Pending<H::Key>) {
        let Ok(runtime) = Handle::try_current() else {
            warn!(
                domain = %self.handler.domain(),
                "No async runtime; deltas wait for an explicit flush"
            );
            return;
        };

        pending.next_timer_id += 1;
        let id = pending.next_timer_id;
        let token = CancellationToken::new();
        pending.timer = Some(Timer {
            id,
            token: token.clone(),
        });

        let this = self.this.clone();
        let period = self.interval;
        runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let Some(accumulator) = this.upgrade() else {
                    break;
                };
                accumulator.flush_on_tick().await;
                if token.is_cancelled() || accumulator.retire_timer_if_idle(id) {
                    break;
                }
            }
        });
    }

    // True when timer `id` should exit: it was replaced, or nothing is left.
    fn retire_timer_if_idle(&self, id: u64) -> bool {
        let mut pending = self.pending.lock();
        match &pending.timer {
            Some(timer) if timer.id == id => {
                if pending.deltas.is_empty() {
                    pending.timer = None;
                    true
                } else {
                    false
                }
            }
            _ => true,
        }
    }
}

impl<H: BatchHandler> Drop for BatchAccumulator<H> {
    fn drop(&mut self) {
        if let Some(timer) = self.pending.get_mut().timer.take() {
            timer.token.cancel();
        }
    }
}
