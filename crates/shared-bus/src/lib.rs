//! # Shared Bus - Event Bus for Client State Notifications
//!
//! Every domain store publishes its change, rollback and sync notifications
//! here. Presentation code subscribes; the domain services never know who
//! listens.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Domain store │                    │  UI / HUD    │
//! │              │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! ## Delivery
//!
//! - Publishing is synchronous and never blocks
//! - Subscribers see events in publish order
//! - A subscriber that falls more than the channel capacity behind skips the
//!   oldest events

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{ClientEvent, EventFilter, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
