//! # Shared Optimistic Crate
//!
//! The reconciliation machinery every optimistic domain service is built on.
//!
//! ## Pieces
//!
//! | Piece | Role |
//! |-------|------|
//! | [`DomainState`] | Snapshot/restore contract and change-event diffing |
//! | [`DomainStore`] | Owns a state, its single-flight guard and its bus handle |
//! | [`execute`] | One speculative mutation, reconciled or rolled back |
//! | [`execute_dual`] | Claim + ledger movement, all or nothing |
//! | [`BatchAccumulator`] | Summed high-frequency deltas flushed on a timer |
//! | [`synchronize`] | Full authoritative overwrite |
//!
//! ## Guarantees
//!
//! - A `RolledBack` or `NetworkError` result is only returned after the
//!   pre-operation snapshot has been restored.
//! - Notifications for one domain leave in the order its writes happened;
//!   the optimistic notification of an operation precedes its confirmation
//!   or rollback.
//! - The single-flight permit is released on every exit path.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod batch;
pub mod coordinator;
pub mod dual;
pub mod guard;
pub mod ledger;
pub mod state;
pub mod store;

#[cfg(test)]
mod testing;

pub use batch::{BatchAccumulator, BatchHandler, FlushHold, FlushOutcome};
pub use coordinator::{execute, synchronize, OptimisticOp};
pub use dual::{execute_dual, DualOp};
pub use guard::{FlightPermit, SingleFlightGuard};
pub use ledger::Ledger;
#[cfg(any(test, feature = "test-utils"))]
pub use ledger::mock::InMemoryLedger;
pub use state::DomainState;
pub use store::{DomainStore, Speculation};
