//! # Domain Store
//!
//! Owns one domain's state behind a mutex together with its single-flight
//! guard and the bus it notifies. Every write goes through here so the change
//! notifications for a domain leave in the same order the writes happened.
//!
//! ## Generations
//!
//! `reset()` bumps a generation counter. Writes tagged with an older
//! generation are dropped, which is how an operation that was in flight
//! during sign-out learns it has been cancelled.

use crate::guard::{FlightPermit, SingleFlightGuard};
use crate::state::DomainState;
use client_telemetry::EVENT_BUS_MESSAGES_SENT;
use parking_lot::Mutex;
use shared_bus::{ClientEvent, EventPublisher};
use shared_types::RollbackEvent;
use std::sync::Arc;
use tracing::trace;

struct Inner<S> {
    state: S,
    generation: u64,
}

/// A snapshot and the generation it belongs to. Returned by a successful
/// speculative write and by [`DomainStore::checkpoint`].
#[derive(Debug, Clone, PartialEq)]
pub struct Speculation<T> {
    /// Generation the speculation was applied in.
    pub generation: u64,
    /// State immediately before the speculation.
    pub snapshot: T,
}

/// Constructor-injected holder of one domain's state.
pub struct DomainStore<S: DomainState> {
    inner: Mutex<Inner<S>>,
    guard: SingleFlightGuard,
    bus: Arc<dyn EventPublisher>,
}

impl<S: DomainState> DomainStore<S> {
    /// Store holding the default state.
    pub fn new(bus: Arc<dyn EventPublisher>) -> Self {
        Self::with_state(S::default(), bus)
    }

    /// Store holding `state`.
    pub fn with_state(state: S, bus: Arc<dyn EventPublisher>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state,
                generation: 0,
            }),
            guard: SingleFlightGuard::new(),
            bus,
        }
    }

    /// Read the state.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.lock().state)
    }

    /// Capture the current state.
    pub fn snapshot(&self) -> S::Snapshot {
        self.inner.lock().state.snapshot()
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Snapshot tagged with the generation it was taken in.
    pub fn checkpoint(&self) -> Speculation<S::Snapshot> {
        let inner = self.inner.lock();
        Speculation {
            generation: inner.generation,
            snapshot: inner.state.snapshot(),
        }
    }

    /// Take the domain's single-flight token.
    pub fn try_acquire(&self) -> Option<FlightPermit<'_>> {
        self.guard.try_acquire()
    }

    /// Whether an operation holds the single-flight token.
    pub fn is_pending(&self) -> bool {
        self.guard.is_busy()
    }

    /// The bus this store notifies.
    pub fn bus(&self) -> &Arc<dyn EventPublisher> {
        &self.bus
    }

    /// Publish an event outside of any state change.
    pub fn publish(&self, event: ClientEvent) {
        let _inner = self.inner.lock();
        self.emit(event);
    }

    /// Apply `f` and publish the resulting change events.
    pub fn mutate<R>(&self, is_optimistic: bool, f: impl FnOnce(&mut S) -> R) -> R {
        let mut inner = self.inner.lock();
        let before = inner.state.snapshot();
        let out = f(&mut inner.state);
        self.emit_diff(&before, &inner.state.snapshot(), is_optimistic);
        out
    }

    /// Apply a fallible `f`. On error, whatever `f` wrote is reverted and
    /// nothing is published.
    pub fn try_mutate<R, E>(
        &self,
        is_optimistic: bool,
        f: impl FnOnce(&mut S) -> Result<R, E>,
    ) -> Result<R, E> {
        let mut inner = self.inner.lock();
        let before = inner.state.snapshot();
        match f(&mut inner.state) {
            Ok(out) => {
                self.emit_diff(&before, &inner.state.snapshot(), is_optimistic);
                Ok(out)
            }
            Err(e) => {
                inner.state.restore(before);
                Err(e)
            }
        }
    }

    /// Snapshot, then apply a speculative write, in one critical section.
    ///
    /// Publishes optimistic change events on success; leaves the state
    /// untouched on error.
    pub fn speculate<E>(
        &self,
        f: impl FnOnce(&mut S) -> Result<(), E>,
    ) -> Result<Speculation<S::Snapshot>, E> {
        let mut inner = self.inner.lock();
        let snapshot = inner.state.snapshot();
        if let Err(e) = f(&mut inner.state) {
            inner.state.restore(snapshot);
            return Err(e);
        }
        self.emit_diff(&snapshot, &inner.state.snapshot(), true);
        Ok(Speculation {
            generation: inner.generation,
            snapshot,
        })
    }

    /// Like [`mutate`](Self::mutate), but only if the store has not been
    /// reset since `generation`.
    pub fn mutate_current<R>(
        &self,
        generation: u64,
        is_optimistic: bool,
        f: impl FnOnce(&mut S) -> R,
    ) -> Option<R> {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            return None;
        }
        let before = inner.state.snapshot();
        let out = f(&mut inner.state);
        self.emit_diff(&before, &inner.state.snapshot(), is_optimistic);
        Some(out)
    }

    /// Restore `snapshot` if the store has not been reset since
    /// `generation`, publishing the reverted values and then `rollback`.
    ///
    /// Returns false if the store was reset in the meantime.
    pub fn restore_current(
        &self,
        generation: u64,
        snapshot: S::Snapshot,
        rollback: Option<RollbackEvent>,
    ) -> bool {
        self.revert_current(generation, rollback, |state| state.restore(snapshot))
    }

    /// Undo part of the state with `undo` if the store has not been reset
    /// since `generation`, publishing the reverted values and then
    /// `rollback`. Writes made by others since the snapshot survive as long
    /// as `undo` leaves them alone.
    ///
    /// Returns false if the store was reset in the meantime.
    pub fn revert_current(
        &self,
        generation: u64,
        rollback: Option<RollbackEvent>,
        undo: impl FnOnce(&mut S),
    ) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            return false;
        }
        let before = inner.state.snapshot();
        undo(&mut inner.state);
        self.emit_diff(&before, &inner.state.snapshot(), false);
        if let Some(rollback) = rollback {
            self.emit(ClientEvent::OperationRolledBack(rollback));
        }
        true
    }

    /// Apply a non-optimistic correction and publish `rollback` after the
    /// change events.
    pub fn correct(&self, rollback: RollbackEvent, f: impl FnOnce(&mut S)) {
        let mut inner = self.inner.lock();
        let before = inner.state.snapshot();
        f(&mut inner.state);
        self.emit_diff(&before, &inner.state.snapshot(), false);
        self.emit(ClientEvent::OperationRolledBack(rollback));
    }

    /// Return to the default state and start a new generation.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        let before = inner.state.snapshot();
        inner.state = S::default();
        inner.generation += 1;
        self.emit_diff(&before, &inner.state.snapshot(), false);
        trace!(domain = %S::DOMAIN, generation = inner.generation, "Store reset");
    }

    // Callers hold the state lock, keeping publish order equal to write order.
    fn emit_diff(&self, before: &S::Snapshot, after: &S::Snapshot, is_optimistic: bool) {
        if before == after {
            return;
        }
        for event in S::change_events(before, after, is_optimistic) {
            self.emit(event);
        }
    }

    fn emit(&self, event: ClientEvent) {
        EVENT_BUS_MESSAGES_SENT.inc();
        self.bus.publish(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{bus, Wallet, WalletSnapshot};
    use proptest::prelude::*;
    use shared_bus::EventFilter;
    use shared_types::{Domain, RollbackCategory};
    use uuid::Uuid;

    #[test]
    fn test_mutate_publishes_diff_events() {
        let bus = bus();
        let mut sub = bus.subscribe(EventFilter::all());
        let store = DomainStore::<Wallet>::new(bus.clone());

        store.mutate(true, |w| w.coins = 10);
        store.mutate(true, |w| w.coins = 10);

        let events = sub.drain();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_optimistic());
    }

    #[test]
    fn test_try_mutate_reverts_on_error() {
        let store = DomainStore::<Wallet>::new(bus());
        let result: Result<(), &str> = store.try_mutate(true, |w| {
            w.coins = 99;
            Err("nope")
        });
        assert!(result.is_err());
        assert_eq!(store.read(|w| w.coins), 0);
    }

    #[test]
    fn test_speculate_returns_pre_state() {
        let store = DomainStore::with_state(Wallet { coins: 5 }, bus());
        let speculation = store
            .speculate::<()>(|w| {
                w.coins += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(speculation.snapshot, WalletSnapshot(5));
        assert_eq!(speculation.generation, 0);
        assert_eq!(store.read(|w| w.coins), 6);
    }

    #[test]
    fn test_restore_after_reset_is_refused() {
        let store = DomainStore::with_state(Wallet { coins: 5 }, bus());
        let generation = store.generation();
        store.reset();

        assert!(!store.restore_current(generation, WalletSnapshot(5), None));
        assert_eq!(store.read(|w| w.coins), 0);
        assert!(store.mutate_current(generation, false, |w| w.coins = 1).is_none());
    }

    #[test]
    fn test_restore_publishes_rollback_after_change() {
        let bus = bus();
        let mut sub = bus.subscribe(EventFilter::all());
        let store = DomainStore::with_state(Wallet { coins: 7 }, bus.clone());

        let rollback = RollbackEvent::new(
            Uuid::new_v4(),
            Domain::Currency,
            "wallet.add",
            "declined",
            RollbackCategory::BusinessRule,
        );
        assert!(store.restore_current(0, WalletSnapshot(3), Some(rollback)));

        let events = sub.drain();
        assert_eq!(events.len(), 2);
        assert!(!events[0].is_optimistic());
        assert!(events[1].as_rollback().is_some());
    }

    proptest! {
        #[test]
        fn prop_restore_snapshot_is_identity(start in 0u64..1_000, writes in proptest::collection::vec(0u64..1_000, 0..8)) {
            let store = DomainStore::with_state(Wallet { coins: start }, bus());
            let snapshot = store.snapshot();
            let generation = store.generation();
            for w in writes {
                store.mutate(true, |s| s.coins = w);
            }
            prop_assert!(store.restore_current(generation, snapshot.clone(), None));
            prop_assert_eq!(store.snapshot(), snapshot);
        }
    }
}
