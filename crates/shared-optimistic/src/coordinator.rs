//! # Optimistic Operation Coordinator
//!
//! Runs one speculative mutation end to end:
//!
//! ```text
//! validate ─► guard ─► snapshot+speculate ─► notify(optimistic)
//!                                                │
//!                                          remote commit
//!                         ┌──────────────┬───────┴───────┬───────────────┐
//!                     Accepted        Rejected        Conflict      transport/panic
//!                    reconcile     restore+rollback  restore+rollback restore+rollback
//!                   SyncCompleted   BusinessRule     StateConflict   Transient/Critical
//! ```
//!
//! The remote commit is the only suspension point. The guard permit lives
//! on the stack of [`execute`], so it is released on every exit path.

use crate::state::DomainState;
use crate::store::DomainStore;
use async_trait::async_trait;
use client_telemetry::{record_operation, record_rollback};
use futures::FutureExt;
use shared_bus::ClientEvent;
use shared_types::{
    GatewayError, OperationResult, RemoteReply, RollbackCategory, RollbackEvent,
    OPERATION_PENDING,
};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// One optimistic mutation against a domain state `S`.
#[async_trait]
pub trait OptimisticOp<S: DomainState>: Send + Sync {
    /// Authoritative data returned by the server on acceptance.
    type Output: Send;
    /// Local validation failure.
    type Error: std::error::Error + Send;

    /// Operation name used in logs, metrics and rollback events.
    fn name(&self) -> &'static str;

    /// Check the request against the current state. Must not mutate.
    fn validate(&self, state: &S) -> Result<(), Self::Error>;

    /// Apply the predicted outcome locally.
    fn speculate(&self, state: &mut S) -> Result<(), Self::Error>;

    /// Ask the server to apply the mutation.
    async fn commit(&self) -> Result<RemoteReply<Self::Output>, GatewayError>;

    /// Overwrite the speculative values with the server's.
    fn reconcile(&self, _state: &mut S, _output: &Self::Output) {}
}

/// Run `op` against `store`.
pub async fn execute<S, O>(store: &DomainStore<S>, op: &O) -> OperationResult<O::Output>
where
    S: DomainState,
    O: OptimisticOp<S>,
{
    let operation_id = Uuid::new_v4();
    let span = info_span!(
        "optimistic_op",
        domain = %S::DOMAIN,
        operation = op.name(),
        %operation_id
    );
    let started = Instant::now();

    let result = run(store, op, operation_id).instrument(span).await;

    record_operation(
        S::DOMAIN.as_str(),
        result.outcome_label(),
        started.elapsed().as_secs_f64(),
    );
    result
}

async fn run<S, O>(store: &DomainStore<S>, op: &O, operation_id: Uuid) -> OperationResult<O::Output>
where
    S: DomainState,
    O: OptimisticOp<S>,
{
    if let Err(e) = store.read(|state| op.validate(state)) {
        debug!(reason = %e, "Validation failed");
        return OperationResult::ValidationError(e.to_string());
    }

    let Some(_permit) = store.try_acquire() else {
        debug!("Domain busy");
        return OperationResult::ValidationError(OPERATION_PENDING.to_string());
    };

    let speculation = match store.speculate(|state| op.speculate(state)) {
        Ok(speculation) => speculation,
        Err(e) => {
            debug!(reason = %e, "Speculative mutation refused");
            return OperationResult::ValidationError(e.to_string());
        }
    };

    let reply = AssertUnwindSafe(op.commit()).catch_unwind().await;

    let rollback = |reason: String, category: RollbackCategory| {
        let event = RollbackEvent::new(operation_id, S::DOMAIN, op.name(), reason, category);
        let restored = store.restore_current(
            speculation.generation,
            speculation.snapshot.clone(),
            Some(event),
        );
        if restored {
            record_rollback(S::DOMAIN.as_str(), category.as_str());
            warn!(category = %category, "Speculative mutation rolled back");
        }
        restored
    };

    match reply {
        Ok(Ok(RemoteReply::Accepted(output))) => {
            let confirmed = store.mutate_current(speculation.generation, false, |state| {
                op.reconcile(state, &output)
            });
            if confirmed.is_none() {
                debug!("Store reset while in flight");
                return OperationResult::Cancelled;
            }
            store.publish(ClientEvent::SyncCompleted {
                domain: S::DOMAIN,
                operation: op.name().to_string(),
            });
            info!("Operation confirmed");
            OperationResult::Success(output)
        }
        Ok(Ok(RemoteReply::Rejected(reason))) => {
            let category = RollbackCategory::BusinessRule;
            if !rollback(reason.clone(), category) {
                return OperationResult::Cancelled;
            }
            OperationResult::RolledBack { reason, category }
        }
        Ok(Ok(RemoteReply::Conflict(reason))) => {
            let category = RollbackCategory::StateConflict;
            if !rollback(reason.clone(), category) {
                return OperationResult::Cancelled;
            }
            OperationResult::RolledBack { reason, category }
        }
        Ok(Err(error)) => {
            let cause = error.to_string();
            if !rollback(cause.clone(), error.category()) {
                return OperationResult::Cancelled;
            }
            OperationResult::NetworkError {
                cause,
                retryable: error.is_retryable(),
            }
        }
        Err(payload) => {
            let cause = panic_message(payload.as_ref());
            if !rollback(cause.clone(), RollbackCategory::Critical) {
                return OperationResult::Cancelled;
            }
            OperationResult::NetworkError {
                cause,
                retryable: false,
            }
        }
    }
}

/// Overwrite local state with a full authoritative fetch.
///
/// Takes the single-flight token. On fetch failure the state is untouched.
pub async fn synchronize<S, T, Fut>(
    store: &DomainStore<S>,
    operation: &'static str,
    fetch: Fut,
    apply: impl FnOnce(&mut S, T),
) -> OperationResult<S::Snapshot>
where
    S: DomainState,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    synchronize_with(store, operation, fetch, |generation, authoritative| {
        store.mutate_current(generation, false, |state| {
            apply(state, authoritative);
            state.snapshot()
        })
    })
    .await
}

/// [`synchronize`] with a caller-supplied write step. `commit` receives the
/// generation the fetch started in and returns the new snapshot, or `None`
/// if the store was reset since.
pub(crate) async fn synchronize_with<S, T, Fut>(
    store: &DomainStore<S>,
    operation: &'static str,
    fetch: Fut,
    commit: impl FnOnce(u64, T) -> Option<S::Snapshot>,
) -> OperationResult<S::Snapshot>
where
    S: DomainState,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    let span = info_span!("sync", domain = %S::DOMAIN, operation);
    let started = Instant::now();

    let result = async {
        let Some(_permit) = store.try_acquire() else {
            return OperationResult::ValidationError(OPERATION_PENDING.to_string());
        };
        let generation = store.generation();

        match AssertUnwindSafe(fetch).catch_unwind().await {
            Ok(Ok(authoritative)) => {
                let Some(snapshot) = commit(generation, authoritative) else {
                    return OperationResult::Cancelled;
                };
                store.publish(ClientEvent::SyncCompleted {
                    domain: S::DOMAIN,
                    operation: operation.to_string(),
                });
                debug!("State synchronized");
                OperationResult::Success(snapshot)
            }
            Ok(Err(error)) => {
                warn!(error = %error, "Sync fetch failed");
                OperationResult::NetworkError {
                    cause: error.to_string(),
                    retryable: error.is_retryable(),
                }
            }
            Err(payload) => OperationResult::NetworkError {
                cause: panic_message(payload.as_ref()),
                retryable: false,
            },
        }
    }
    .instrument(span)
    .await;

    record_operation(
        S::DOMAIN.as_str(),
        result.outcome_label(),
        started.elapsed().as_secs_f64(),
    );
    result
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("unexpected failure: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("unexpected failure: {s}")
    } else {
        "unexpected failure".to_string()
    }
}
