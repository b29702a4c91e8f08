//! # RL-03 Achievements
//!
//! Achievement progress, unlocks and reward claims.
//!
//! **Architecture:** Hexagonal (Domain + Ports/Adapters)
//!
//! Progress reports are optimistic and monotonic. A claim marks the
//! achievement claimed and credits its reward through the currency ledger;
//! both happen or neither does.

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    Achievement, AchievementBook, AchievementError, AchievementsSnapshot, AchievementsState,
};
pub use ports::{AchievementsApi, AchievementsGateway};
pub use service::AchievementsService;
