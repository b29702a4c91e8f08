//! # Client Events
//!
//! Defines every notification that flows through the shared bus. Domain
//! change events carry previous/new values and an `is_optimistic` flag so
//! subscribers can tell speculation from confirmed truth.

use serde::{Deserialize, Serialize};
use shared_types::{CurrencyType, Domain, RollbackEvent, SessionState};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientEvent {
    // =========================================================================
    // CURRENCY
    // =========================================================================
    /// A balance moved.
    BalanceChanged {
        /// Which currency.
        currency: CurrencyType,
        /// Balance before the change.
        previous: u64,
        /// Balance after the change.
        current: u64,
        /// Unconfirmed by the server.
        is_optimistic: bool,
    },

    // =========================================================================
    // INVENTORY
    // =========================================================================
    /// An item was gained or lost.
    ItemOwnershipChanged {
        /// Item identifier.
        item_id: String,
        /// Whether the item is now owned.
        owned: bool,
        /// Unconfirmed by the server.
        is_optimistic: bool,
    },

    /// The item equipped in a slot changed.
    SlotChanged {
        /// Slot identifier.
        slot: String,
        /// Item equipped before.
        previous: Option<String>,
        /// Item equipped now.
        current: Option<String>,
        /// Unconfirmed by the server.
        is_optimistic: bool,
    },

    // =========================================================================
    // ACHIEVEMENTS
    // =========================================================================
    /// Achievement progress or claim status changed.
    AchievementChanged {
        /// Achievement identifier.
        achievement_id: String,
        /// Progress before the change.
        previous_progress: u32,
        /// Progress after the change.
        current_progress: u32,
        /// Whether the achievement is unlocked.
        unlocked: bool,
        /// Whether its reward has been claimed.
        claimed: bool,
        /// Unconfirmed by the server.
        is_optimistic: bool,
    },

    // =========================================================================
    // TASKS
    // =========================================================================
    /// Task progress or claim status changed.
    TaskChanged {
        /// Task identifier.
        task_id: String,
        /// Progress before the change.
        previous_progress: u32,
        /// Progress after the change.
        current_progress: u32,
        /// Whether progress reached the target.
        completed: bool,
        /// Whether its reward has been claimed.
        claimed: bool,
        /// Unconfirmed by the server.
        is_optimistic: bool,
    },

    // =========================================================================
    // ENERGY
    // =========================================================================
    /// Energy counters changed.
    EnergyChanged {
        /// Energy before the change.
        previous: u32,
        /// Energy after the change.
        current: u32,
        /// Energy cap.
        max: u32,
        /// Unconfirmed by the server.
        is_optimistic: bool,
    },

    // =========================================================================
    // REFERRALS
    // =========================================================================
    /// The code this player was referred by changed.
    ReferralChanged {
        /// Referrer code before.
        previous: Option<String>,
        /// Referrer code now.
        current: Option<String>,
        /// Unconfirmed by the server.
        is_optimistic: bool,
    },

    /// A referred player's reward status changed.
    RefereeChanged {
        /// Referred player identifier.
        referee_id: String,
        /// Whether the referral reward has been claimed.
        claimed: bool,
        /// Unconfirmed by the server.
        is_optimistic: bool,
    },

    // =========================================================================
    // SESSION (pessimistic; never optimistic)
    // =========================================================================
    /// The run-session state machine transitioned.
    SessionStateChanged {
        /// State before the transition.
        previous: SessionState,
        /// State after the transition.
        current: SessionState,
        /// Session identifier, when one is held.
        session_id: Option<String>,
    },

    // =========================================================================
    // RECONCILIATION
    // =========================================================================
    /// A speculative mutation was reverted.
    OperationRolledBack(RollbackEvent),

    /// Local state was confirmed by, or overwritten from, the server.
    SyncCompleted {
        /// Domain that was confirmed.
        domain: Domain,
        /// Operation that produced the confirmation.
        operation: String,
    },
}

impl ClientEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        EventTopic::Domain(self.domain())
    }

    /// Domain that emitted this event.
    #[must_use]
    pub fn domain(&self) -> Domain {
        match self {
            Self::BalanceChanged { .. } => Domain::Currency,
            Self::ItemOwnershipChanged { .. } | Self::SlotChanged { .. } => Domain::Inventory,
            Self::AchievementChanged { .. } => Domain::Achievements,
            Self::TaskChanged { .. } => Domain::Tasks,
            Self::EnergyChanged { .. } => Domain::Energy,
            Self::ReferralChanged { .. } | Self::RefereeChanged { .. } => Domain::Referrals,
            Self::SessionStateChanged { .. } => Domain::Session,
            Self::OperationRolledBack(rollback) => rollback.domain,
            Self::SyncCompleted { domain, .. } => *domain,
        }
    }

    /// Whether this event reports an unconfirmed change.
    #[must_use]
    pub fn is_optimistic(&self) -> bool {
        match self {
            Self::BalanceChanged { is_optimistic, .. }
            | Self::ItemOwnershipChanged { is_optimistic, .. }
            | Self::SlotChanged { is_optimistic, .. }
            | Self::AchievementChanged { is_optimistic, .. }
            | Self::TaskChanged { is_optimistic, .. }
            | Self::EnergyChanged { is_optimistic, .. }
            | Self::ReferralChanged { is_optimistic, .. }
            | Self::RefereeChanged { is_optimistic, .. } => *is_optimistic,
            Self::SessionStateChanged { .. }
            | Self::OperationRolledBack(_)
            | Self::SyncCompleted { .. } => false,
        }
    }

    /// The rollback payload, if this is a rollback.
    #[must_use]
    pub fn as_rollback(&self) -> Option<&RollbackEvent> {
        match self {
            Self::OperationRolledBack(rollback) => Some(rollback),
            _ => None,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Everything one domain emits, rollbacks included.
    Domain(Domain),
    /// Rollbacks from every domain.
    Rollbacks,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Create a filter for specific domains.
    #[must_use]
    pub fn domains(domains: &[Domain]) -> Self {
        Self::topics(domains.iter().copied().map(EventTopic::Domain).collect())
    }

    /// Create a filter that only passes rollbacks.
    #[must_use]
    pub fn rollbacks() -> Self {
        Self::topics(vec![EventTopic::Rollbacks])
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &ClientEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
            || (event.as_rollback().is_some() && self.topics.contains(&EventTopic::Rollbacks))
    }
}
