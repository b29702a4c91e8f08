//! The contract every optimistic domain state fulfils.

use shared_bus::ClientEvent;
use shared_types::Domain;
use std::fmt::Debug;

/// Mutable state owned by one domain store.
///
/// `restore(snapshot())` must be an identity, regardless of what happened to
/// the state in between.
pub trait DomainState: Default + Send + 'static {
    /// Immutable copy of the state at one instant.
    type Snapshot: Clone + Debug + PartialEq + Send + Sync + 'static;

    /// Domain this state belongs to.
    const DOMAIN: Domain;

    /// Capture the current state.
    fn snapshot(&self) -> Self::Snapshot;

    /// Overwrite the current state with a snapshot.
    fn restore(&mut self, snapshot: Self::Snapshot);

    /// Change notifications describing the move from `before` to `after`.
    ///
    /// Returns nothing when the two are equal.
    fn change_events(
        before: &Self::Snapshot,
        after: &Self::Snapshot,
        is_optimistic: bool,
    ) -> Vec<ClientEvent>;
}
