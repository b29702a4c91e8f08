//! # Dual-Resource Coordinator
//!
//! A claim (or purchase) touches two domains: the claiming domain's flag and
//! the currency ledger. After [`execute_dual`] returns, either both effects
//! are reflected locally or neither is.
//!
//! ## Rollback order
//!
//! Claim first, then the ledger; one rollback event, in the claiming domain.
//! Only the claimed item and the entry this claim applied are undone, so
//! writes other operations made in the meantime survive.

use crate::coordinator::panic_message;
use crate::ledger::Ledger;
use crate::state::DomainState;
use crate::store::DomainStore;
use async_trait::async_trait;
use client_telemetry::{record_operation, record_rollback};
use futures::FutureExt;
use shared_bus::ClientEvent;
use shared_types::{
    GatewayError, LedgerEntry, OperationResult, RemoteReply, RollbackCategory, RollbackEvent,
    OPERATION_PENDING,
};
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// An operation that marks something in domain `S` and moves currency.
#[async_trait]
pub trait DualOp<S: DomainState>: Send + Sync {
    /// Authoritative data returned by the server on confirmation.
    type Output: Send;
    /// Eligibility failure.
    type Error: std::error::Error + Send;

    /// Operation name used in logs, metrics and rollback events.
    fn name(&self) -> &'static str;

    /// Check eligibility in the claiming domain. Returns the currency
    /// movement to perform, if any.
    fn validate(&self, state: &S) -> Result<Option<LedgerEntry>, Self::Error>;

    /// Speculatively mark the claim.
    fn mark(&self, state: &mut S) -> Result<(), Self::Error>;

    /// Ask the server to confirm the claim.
    async fn confirm(&self) -> Result<RemoteReply<Self::Output>, GatewayError>;

    /// Apply the server's view of the claimed item.
    fn reconcile(&self, _state: &mut S, _output: &Self::Output) {}

    /// Undo `mark`, given the state captured just before it.
    ///
    /// Restores the whole snapshot by default. Domains that accept writes
    /// without the single-flight permit override this to revert only the
    /// claimed item.
    fn unmark(&self, state: &mut S, before: S::Snapshot) {
        state.restore(before);
    }
}

/// Run `op` against `store`, moving currency through `ledger`.
pub async fn execute_dual<S, L, O>(
    store: &DomainStore<S>,
    ledger: &L,
    op: &O,
) -> OperationResult<O::Output>
where
    S: DomainState,
    L: Ledger + ?Sized,
    O: DualOp<S>,
{
    let operation_id = Uuid::new_v4();
    let span = info_span!(
        "dual_op",
        domain = %S::DOMAIN,
        operation = op.name(),
        %operation_id
    );
    let started = Instant::now();

    let result = run(store, ledger, op, operation_id).instrument(span).await;

    record_operation(
        S::DOMAIN.as_str(),
        result.outcome_label(),
        started.elapsed().as_secs_f64(),
    );
    result
}

async fn run<S, L, O>(
    store: &DomainStore<S>,
    ledger: &L,
    op: &O,
    operation_id: Uuid,
) -> OperationResult<O::Output>
where
    S: DomainState,
    L: Ledger + ?Sized,
    O: DualOp<S>,
{
    let entry = match store.read(|state| op.validate(state)) {
        Ok(entry) => entry,
        Err(e) => {
            debug!(reason = %e, "Not eligible");
            return OperationResult::ValidationError(e.to_string());
        }
    };

    let Some(_permit) = store.try_acquire() else {
        return OperationResult::ValidationError(OPERATION_PENDING.to_string());
    };

    let checkpoint = ledger.checkpoint();
    let speculation = match store.speculate(|state| op.mark(state)) {
        Ok(speculation) => speculation,
        Err(e) => return OperationResult::ValidationError(e.to_string()),
    };
    let generation = speculation.generation;
    let snapshot = speculation.snapshot;

    let rollback_event = |reason: &str, category: RollbackCategory| {
        record_rollback(S::DOMAIN.as_str(), category.as_str());
        warn!(category = %category, reason, "Claim rolled back");
        RollbackEvent::new(operation_id, S::DOMAIN, op.name(), reason, category)
    };

    let mut ledger_applied = false;
    if let Some(entry) = &entry {
        let inner = ledger.apply(entry, op.name()).await;
        let (escalated, category) = match inner {
            OperationResult::Success(balance) => {
                debug!(balance, "Ledger entry applied");
                ledger_applied = true;
                (None, RollbackCategory::BusinessRule)
            }
            OperationResult::NetworkError { cause, retryable } => {
                let category = if retryable {
                    RollbackCategory::Transient
                } else {
                    RollbackCategory::Critical
                };
                (Some(OperationResult::NetworkError { cause, retryable }), category)
            }
            OperationResult::RolledBack { reason, category } => {
                (Some(OperationResult::RolledBack { reason, category }), category)
            }
            OperationResult::ValidationError(reason) => {
                let category = RollbackCategory::BusinessRule;
                (Some(OperationResult::RolledBack { reason, category }), category)
            }
            OperationResult::Cancelled => (Some(OperationResult::Cancelled), RollbackCategory::Critical),
        };

        if let Some(failure) = escalated {
            if matches!(failure, OperationResult::Cancelled) {
                store.revert_current(generation, None, |state| op.unmark(state, snapshot));
                return OperationResult::Cancelled;
            }
            let reason = failure.failure_reason().unwrap_or_default().to_string();
            let event = rollback_event(&reason, category);
            if !store.revert_current(generation, Some(event), |state| op.unmark(state, snapshot)) {
                return OperationResult::Cancelled;
            }
            return failure;
        }
    }

    let reply = AssertUnwindSafe(op.confirm()).catch_unwind().await;

    let (failure, category) = match reply {
        Ok(Ok(RemoteReply::Accepted(output))) => {
            let confirmed = store.mutate_current(generation, false, |state| {
                op.reconcile(state, &output)
            });
            if confirmed.is_none() {
                return OperationResult::Cancelled;
            }
            store.publish(ClientEvent::SyncCompleted {
                domain: S::DOMAIN,
                operation: op.name().to_string(),
            });
            info!(ledger_applied, "Claim confirmed");
            return OperationResult::Success(output);
        }
        Ok(Ok(RemoteReply::Rejected(reason))) => {
            let category = RollbackCategory::BusinessRule;
            (OperationResult::RolledBack { reason, category }, category)
        }
        Ok(Ok(RemoteReply::Conflict(reason))) => {
            let category = RollbackCategory::StateConflict;
            (OperationResult::RolledBack { reason, category }, category)
        }
        Ok(Err(error)) => (
            OperationResult::NetworkError {
                cause: error.to_string(),
                retryable: error.is_retryable(),
            },
            error.category(),
        ),
        Err(payload) => (
            OperationResult::NetworkError {
                cause: panic_message(payload.as_ref()),
                retryable: false,
            },
            RollbackCategory::Critical,
        ),
    };

    let claim_restored = store.revert_current(generation, None, |state| op.unmark(state, snapshot));
    if let (true, Some(entry)) = (ledger_applied, &entry) {
        ledger.revert(checkpoint, entry);
    }
    if !claim_restored {
        return OperationResult::Cancelled;
    }
    let reason = failure.failure_reason().unwrap_or_default().to_string();
    store.publish(ClientEvent::OperationRolledBack(rollback_event(&reason, category)));
    failure
}
