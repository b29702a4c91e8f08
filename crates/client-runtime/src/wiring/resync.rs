//! # Conflict Resync
//!
//! A `StateConflict` rollback means the client's view of a domain is stale.
//! The handler re-fetches that domain so the next attempt starts from the
//! server's state.
//!
//! ```text
//! OperationRolledBack{StateConflict, domain} ──→ sync_domain(domain)
//!                                                     │
//!                                      pending? ──────┴──→ retry after delay
//! ```

use crate::adapters::Backend;
use crate::container::ClientContainer;
use shared_bus::{ClientEvent, Subscription};
use shared_types::{Domain, OperationResult, RollbackCategory, OPERATION_PENDING};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Sync attempts per conflict while another operation holds the domain.
pub const RESYNC_ATTEMPTS: u32 = 3;

const RETRY_DELAY: Duration = Duration::from_millis(50);

/// Re-fetches domains after conflicting rollbacks.
pub struct ResyncHandler<B: Backend> {
    container: Arc<ClientContainer<B>>,
    subscription: Subscription,
}

impl<B: Backend> ResyncHandler<B> {
    /// Handler consuming `subscription`, which should carry rollbacks.
    pub fn new(container: Arc<ClientContainer<B>>, subscription: Subscription) -> Self {
        Self {
            container,
            subscription,
        }
    }

    /// Run until the bus closes.
    pub async fn run(mut self) {
        info!("Resync handler started");
        while let Some(event) = self.subscription.recv().await {
            let ClientEvent::OperationRolledBack(rollback) = event else {
                continue;
            };
            if rollback.category != RollbackCategory::StateConflict {
                continue;
            }
            info!(
                domain = %rollback.domain,
                operation_id = %rollback.operation_id,
                operation = %rollback.operation_type,
                "Conflict rollback, resyncing domain"
            );
            self.resync(rollback.domain).await;
        }
        debug!("Event bus closed, resync handler stopping");
    }

    async fn resync(&self, domain: Domain) -> OperationResult<()> {
        let mut outcome = OperationResult::Cancelled;
        for attempt in 1..=RESYNC_ATTEMPTS {
            outcome = self.container.sync_domain(domain).await;
            if outcome.is_success() {
                info!(%domain, "Domain resynced");
                return outcome;
            }
            let busy = matches!(
                &outcome,
                OperationResult::ValidationError(reason) if reason == OPERATION_PENDING
            );
            if !busy {
                break;
            }
            debug!(%domain, attempt, "Domain busy, retrying resync");
            tokio::time::sleep(RETRY_DELAY).await;
        }
        warn!(
            %domain,
            reason = outcome.failure_reason().unwrap_or("cancelled"),
            "Resync failed"
        );
        outcome
    }
}
